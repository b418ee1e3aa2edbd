/// Classification for fallback policy.
///
/// Used by the aggregation loop to decide whether an error ends the logical
/// call or only the current provider attempt.
///
/// | Class | Try Next Provider? | Reaches the caller? |
/// |-------|--------------------|---------------------|
/// | `Never` | No | Yes |
/// | `NextProvider` | Yes | Only inside the final attempt log |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal - bad configuration, unknown provider, or exhausted chain.
    /// Retrying with another provider cannot help.
    Never,

    /// Soft failure of a single attempt.
    ///
    /// Network and HTTP failures, error payloads and shape mismatches.
    /// The failure is appended to the attempt log and the next provider in
    /// the sequence is tried. Nothing about the failure outlives the call.
    NextProvider,
}
