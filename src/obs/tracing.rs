// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// A span builder used by the signer and the request executor.
#[derive(Clone, Debug)]
pub struct ObsSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ObsSpan {
	/// Span covering one HTTP exchange.
	pub fn request(method: &Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("asc_client.request", method = %method, path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, path);

			Self {}
		}
	}

	/// Span covering one signing operation.
	pub fn credential(key_id: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("asc_client.credential", kid = key_id);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = key_id;

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> ObsSpanGuard {
		#[cfg(feature = "tracing")]
		{
			ObsSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			ObsSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`ObsSpan::entered`].
pub struct ObsSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for ObsSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ObsSpanGuard(..)")
	}
}
