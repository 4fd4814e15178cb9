// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("rates_broker.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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

/// Emits a `warn!` event for a degraded but recoverable path.
pub(crate) fn warn_degraded(stage: &'static str, subject: &dyn Display, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			stage,
			subject = %subject,
			error = %error,
			"Continuing after a storage failure."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, subject, error);
	}
}

/// Emits a `debug!` event naming the tier that served a cascade.
pub(crate) fn debug_source(subject: &dyn Display, source: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(subject = %subject, source, "Rate cascade resolved.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (subject, source);
	}
}
