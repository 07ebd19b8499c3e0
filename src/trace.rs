//! Errors enriched with the backtrace of the point they were raised at.
//! Backtraces are captured in debug builds only; release builds pay nothing.

use std::{
	backtrace::Backtrace,
	error::Error as StdError,
	fmt,
	ops::{Deref, DerefMut},
};


pub type Result<T, E> = std::result::Result<T, Traced<E>>;

/// Wraps an error value together with the place it came from.
pub struct Traced<E> {
	inner: E,
	#[cfg(debug_assertions)]
	backtrace: Backtrace,
}

pub trait Traceable<E> {
	fn trace(self) -> Traced<E>;
}


/// Shorthand for raising a traced error.
pub fn err<T, E>(inner: E) -> Result<T, E> { Err(Traced::new(inner)) }


impl<E> Traced<E> {
	pub fn new(inner: E) -> Self {
		Self {
			inner,
			#[cfg(debug_assertions)]
			backtrace: Backtrace::force_capture(),
		}
	}

	pub fn backtrace(&self) -> Option<&Backtrace> {
		#[cfg(debug_assertions)]
		{
			Some(&self.backtrace)
		}
		#[cfg(not(debug_assertions))]
		{
			None
		}
	}
}

impl<E> Traceable<E> for E {
	fn trace(self) -> Traced<E> { Traced::new(self) }
}

impl<E> From<E> for Traced<E> {
	fn from(inner: E) -> Self { Self::new(inner) }
}

impl<E> Deref for Traced<E> {
	type Target = E;

	fn deref(&self) -> &Self::Target { &self.inner }
}

impl<E> DerefMut for Traced<E> {
	fn deref_mut(&mut self) -> &mut Self::Target { &mut self.inner }
}

impl<E> fmt::Debug for Traced<E>
where
	E: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{:?}", &self.inner)?;
		if let Some(backtrace) = self.backtrace() {
			write!(f, "{}", backtrace)?;
		}
		Ok(())
	}
}

impl<E> fmt::Display for Traced<E>
where
	E: fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.inner, f)
	}
}

impl<E> StdError for Traced<E>
where
	E: StdError,
{
	fn source(&self) -> Option<&(dyn StdError + 'static)> { self.inner.source() }
}
