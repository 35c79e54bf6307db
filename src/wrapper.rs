//! Class and member interception.
//!
//! [`wrap_class`] returns a [`ClassLogger`], the drop-in replacement for a
//! type's constructor: constructing through it logs the construction and yields
//! a [`Logged`] instance. Calling a member through [`Logged`] (or through
//! [`ClassLogger`] with an explicit receiver) resolves the configuration for
//! that member, emits the start message, runs the original body with the
//! original receiver and arguments, and emits the end message once the outcome
//! is known. Members without an attached override run without any logging.

use std::{
    any::Any,
    convert::Infallible,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::{
    config::{LoggerConfig, global_default},
    formatter::{CallRecord, CallResult},
    future::Intercepted,
    inspect::{Inspect, short_type_name},
    metadata,
    value::{Args, ErrorValue, ToValue, Value},
};

/// Member name used for construction messages.
pub const CONSTRUCT: &str = "construct";

/// Wraps the class `T`.
///
/// # Examples
///
/// ```
/// use class_logger::{Inspect, PartialLoggerConfig, metadata, wrap_class};
///
/// struct Greeter;
///
/// impl Inspect for Greeter {}
///
/// metadata::attach_member::<Greeter>("greet", PartialLoggerConfig::new());
///
/// let greeter = wrap_class::<Greeter>().construct((), |()| Greeter);
/// let greeting = greeter.call("greet", ("world",), |_, (name,)| format!("Hello, {name}!"));
/// assert_eq!(greeting, "Hello, world!");
/// ```
#[must_use]
pub fn wrap_class<T: Inspect + 'static>() -> ClassLogger<T> {
    ClassLogger::new()
}

/// One intercepted call, from its start message to its end message.
pub(crate) struct Interception<'a> {
    config: LoggerConfig,
    class_name: &'static str,
    member: &'a str,
    args: Vec<Value>,
}

impl Interception<'_> {
    fn record<'r>(&'r self, receiver: Option<&'r dyn Inspect>) -> CallRecord<'r> {
        CallRecord {
            class_name: self.class_name,
            member_name: self.member,
            args: &self.args,
            class_instance: receiver,
            include: &self.config.include,
        }
    }

    pub(crate) fn start(&self, receiver: Option<&dyn Inspect>) {
        let message = self.config.formatter.start(&self.record(receiver));
        self.config.log.emit(&message);
    }

    pub(crate) fn finish<R, E>(&self, receiver: Option<&dyn Inspect>, outcome: Result<&R, &E>)
    where
        R: ToValue + ?Sized,
        E: ToValue + ?Sized,
    {
        let (error, result) = match outcome {
            Ok(value) => (false, value.to_value()),
            Err(error) => (true, error.to_value()),
        };
        let message = self.config.formatter.end(&CallResult {
            record: self.record(receiver),
            error,
            result: &result,
        });

        if error {
            self.config.log_error.emit(&message);
        } else {
            self.config.log.emit(&message);
        }
    }

    /// Emits the error end message for a panicking body, then resumes unwinding
    /// with the original payload.
    pub(crate) fn unwind(
        &self,
        receiver: Option<&dyn Inspect>,
        payload: Box<dyn Any + Send>,
    ) -> ! {
        let error = ErrorValue::from_panic(&*payload);
        self.finish::<(), _>(receiver, Err(&error));
        panic::resume_unwind(payload)
    }
}

impl fmt::Debug for Interception<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interception")
            .field("class_name", &self.class_name)
            .field("member", &self.member)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// The wrapped constructor of `T`, also the entry point for static members and
/// for calls with an explicit receiver.
pub struct ClassLogger<T> {
    class_name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Inspect + 'static> ClassLogger<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            class_name: short_type_name(std::any::type_name::<T>()),
            _marker: PhantomData,
        }
    }

    /// The name used as the prefix of every message.
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        self.class_name
    }

    fn class_config() -> LoggerConfig {
        let config = LoggerConfig::clone(&global_default());
        match metadata::class_override::<T>() {
            Some(class) => config.apply(&class),
            None => config,
        }
    }

    fn intercept<'a>(&self, member: &'a str, args: &impl Args) -> Option<Interception<'a>> {
        let Some(member_override) = metadata::member_override::<T>(member) else {
            log::trace!("{}.{member} has no logger attached", self.class_name);
            return None;
        };

        Some(Interception {
            config: Self::class_config().apply(&member_override),
            class_name: self.class_name,
            member,
            args: args.to_values(),
        })
    }

    fn log_construct(&self, args: &impl Args) {
        let config = Self::class_config();
        if !config.include.construct {
            return;
        }

        let call = Interception {
            config,
            class_name: self.class_name,
            member: CONSTRUCT,
            args: args.to_values(),
        };
        call.start(None);
    }

    /// Constructs a new instance through `constructor` and wraps it.
    ///
    /// Emits the construction message unless `include.construct` is disabled.
    pub fn construct<A, C>(&self, args: A, constructor: C) -> Logged<T>
    where
        A: Args,
        C: FnOnce(A) -> T,
    {
        self.log_construct(&args);
        Logged::new(constructor(args), *self)
    }

    /// Fallible version of [`ClassLogger::construct`].
    ///
    /// # Errors
    ///
    /// Returns the constructor's error unchanged.
    pub fn try_construct<A, E, C>(&self, args: A, constructor: C) -> Result<Logged<T>, E>
    where
        A: Args,
        C: FnOnce(A) -> Result<T, E>,
    {
        self.log_construct(&args);
        constructor(args).map(|instance| Logged::new(instance, *self))
    }

    /// Wraps an instance that was created elsewhere, without logging a construction.
    pub const fn wrap(&self, instance: T) -> Logged<T> {
        Logged::new(instance, *self)
    }

    fn invoke<A, R, E>(
        &self,
        receiver: Option<&T>,
        member: &str,
        args: A,
        body: impl FnOnce(A) -> Result<R, E>,
    ) -> Result<R, E>
    where
        A: Args,
        R: ToValue,
        E: ToValue,
    {
        let Some(call) = self.intercept(member, &args) else {
            return body(args);
        };

        let receiver = receiver.map(|receiver| receiver as &dyn Inspect);
        call.start(receiver);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(args)))
            .unwrap_or_else(|payload| call.unwind(receiver, payload));
        call.finish(receiver, outcome.as_ref());
        outcome
    }

    fn invoke_async<'a, A, F, R, E>(
        &self,
        receiver: Option<&'a T>,
        member: &'a str,
        args: A,
        body: impl FnOnce(A) -> F,
    ) -> Intercepted<'a, T, F>
    where
        A: Args,
        F: Future<Output = Result<R, E>>,
    {
        let call = self.intercept(member, &args);
        if let Some(call) = &call {
            call.start(receiver.map(|receiver| receiver as &dyn Inspect));
        }
        Intercepted::new(body(args), receiver, call)
    }

    /// Calls a member of `receiver`, which does not need to be wrapped.
    pub fn call_on<A, R>(&self, receiver: &T, member: &str, args: A, method: impl FnOnce(&T, A) -> R) -> R
    where
        A: Args,
        R: ToValue,
    {
        let outcome = self.invoke(Some(receiver), member, args, |args| {
            Ok::<_, Infallible>(method(receiver, args))
        });
        match outcome {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Calls a fallible member of `receiver`; an `Err` is logged to `log_error`.
    ///
    /// # Errors
    ///
    /// Returns the member's error unchanged.
    pub fn try_call_on<A, R, E>(
        &self,
        receiver: &T,
        member: &str,
        args: A,
        method: impl FnOnce(&T, A) -> Result<R, E>,
    ) -> Result<R, E>
    where
        A: Args,
        R: ToValue,
        E: ToValue,
    {
        self.invoke(Some(receiver), member, args, |args| method(receiver, args))
    }

    /// Calls an asynchronous member of `receiver`.
    ///
    /// The start message is emitted right away; the end message is emitted when
    /// the returned future resolves.
    pub fn call_async_on<'a, A, F, R, E>(
        &self,
        receiver: &'a T,
        member: &'a str,
        args: A,
        method: impl FnOnce(&'a T, A) -> F,
    ) -> Intercepted<'a, T, F>
    where
        A: Args,
        F: Future<Output = Result<R, E>>,
        R: ToValue,
        E: ToValue,
    {
        self.invoke_async(Some(receiver), member, args, |args| method(receiver, args))
    }

    /// Calls a static member; the class instance renders as `N/A`.
    pub fn call_static<A, R>(&self, member: &str, args: A, function: impl FnOnce(A) -> R) -> R
    where
        A: Args,
        R: ToValue,
    {
        let outcome = self.invoke(None, member, args, |args| Ok::<_, Infallible>(function(args)));
        match outcome {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Calls a fallible static member.
    ///
    /// # Errors
    ///
    /// Returns the member's error unchanged.
    pub fn try_call_static<A, R, E>(
        &self,
        member: &str,
        args: A,
        function: impl FnOnce(A) -> Result<R, E>,
    ) -> Result<R, E>
    where
        A: Args,
        R: ToValue,
        E: ToValue,
    {
        self.invoke(None, member, args, function)
    }

    /// Calls an asynchronous static member.
    pub fn call_async_static<'a, A, F, R, E>(
        &self,
        member: &'a str,
        args: A,
        function: impl FnOnce(A) -> F,
    ) -> Intercepted<'a, T, F>
    where
        A: Args,
        F: Future<Output = Result<R, E>>,
        R: ToValue,
        E: ToValue,
    {
        self.invoke_async(None, member, args, function)
    }

    /// Foreign metadata attached to the class or one of its members.
    #[must_use]
    pub fn extension<V>(&self, member: Option<&str>) -> Option<Arc<V>>
    where
        V: Send + Sync + 'static,
    {
        metadata::extension::<T, V>(member)
    }
}

impl<T> Clone for ClassLogger<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ClassLogger<T> {}

impl<T: Inspect + 'static> Default for ClassLogger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ClassLogger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassLogger")
            .field("class_name", &self.class_name)
            .finish()
    }
}

/// An instance created through a [`ClassLogger`].
///
/// Derefs to the original instance, so data fields and members that are not
/// routed through [`Logged::call`] and friends behave exactly as on `T`.
pub struct Logged<T> {
    inner: T,
    class: ClassLogger<T>,
}

impl<T> Logged<T> {
    const fn new(inner: T, class: ClassLogger<T>) -> Self {
        Self { inner, class }
    }

    /// Unwraps the original instance.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The wrapped class this instance was created by.
    pub const fn class(&self) -> ClassLogger<T> {
        self.class
    }
}

impl<T: Inspect + 'static> Logged<T> {
    pub fn call<A, R>(&self, member: &str, args: A, method: impl FnOnce(&T, A) -> R) -> R
    where
        A: Args,
        R: ToValue,
    {
        self.class.call_on(&self.inner, member, args, method)
    }

    /// # Errors
    ///
    /// Returns the member's error unchanged.
    pub fn try_call<A, R, E>(
        &self,
        member: &str,
        args: A,
        method: impl FnOnce(&T, A) -> Result<R, E>,
    ) -> Result<R, E>
    where
        A: Args,
        R: ToValue,
        E: ToValue,
    {
        self.class.try_call_on(&self.inner, member, args, method)
    }

    pub fn call_async<'a, A, F, R, E>(
        &'a self,
        member: &'a str,
        args: A,
        method: impl FnOnce(&'a T, A) -> F,
    ) -> Intercepted<'a, T, F>
    where
        A: Args,
        F: Future<Output = Result<R, E>>,
        R: ToValue,
        E: ToValue,
    {
        self.class.call_async_on(&self.inner, member, args, method)
    }

    /// Calls a member that needs `&mut T`.
    ///
    /// The instance snapshot for the end message is taken after the member returns.
    pub fn call_mut<A, R>(&mut self, member: &str, args: A, method: impl FnOnce(&mut T, A) -> R) -> R
    where
        A: Args,
        R: ToValue,
    {
        let outcome = self.try_call_mut(member, args, |inner, args| {
            Ok::<_, Infallible>(method(inner, args))
        });
        match outcome {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible version of [`Logged::call_mut`].
    ///
    /// # Errors
    ///
    /// Returns the member's error unchanged.
    pub fn try_call_mut<A, R, E>(
        &mut self,
        member: &str,
        args: A,
        method: impl FnOnce(&mut T, A) -> Result<R, E>,
    ) -> Result<R, E>
    where
        A: Args,
        R: ToValue,
        E: ToValue,
    {
        let Some(call) = self.class.intercept(member, &args) else {
            return method(&mut self.inner, args);
        };

        call.start(Some(&self.inner as &dyn Inspect));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| method(&mut self.inner, args)))
            .unwrap_or_else(|payload| {
                call.unwind(Some(&self.inner as &dyn Inspect), payload)
            });
        call.finish(Some(&self.inner as &dyn Inspect), outcome.as_ref());
        outcome
    }

    /// Foreign metadata attached to the class or one of its members.
    #[must_use]
    pub fn extension<V>(&self, member: Option<&str>) -> Option<Arc<V>>
    where
        V: Send + Sync + 'static,
    {
        self.class.extension(member)
    }
}

impl<T> Deref for Logged<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> DerefMut for Logged<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T> AsRef<T> for Logged<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

impl<T> AsMut<T> for Logged<T> {
    fn as_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Logged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logged")
            .field("class", &self.class.class_name)
            .field("inner", &self.inner)
            .finish()
    }
}
