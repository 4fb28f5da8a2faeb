//! Cancellation reasons: canned codes plus a custom escape hatch.
//!
//! A cancellation is never a bare status flip; the initiating party must
//! supply a reason, which is persisted next to the `cancelled` status and
//! shown to the other party and to administrators.

/// Fixed reason recorded for administrator-initiated cancellations.
pub const ADMIN_CANCELLATION_REASON: &str = "Cancelled by the support team";

/// Validation errors for cancellation reasons.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReasonValidationError {
    /// The reason code is not one of the canned codes or `custom`.
    #[error("unknown cancellation reason code: {code}")]
    UnknownCode {
        /// The rejected code.
        code: String,
    },
    /// `custom` was selected but no free text was provided.
    #[error("a custom cancellation reason requires non-empty text")]
    EmptyCustomText,
}

/// A validated cancellation reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// The passenger no longer needs the ride.
    ChangeOfPlans,
    /// No driver accepted in an acceptable time.
    WaitedTooLong,
    /// The request was created by mistake.
    RequestedByMistake,
    /// Free-text reason entered by the initiating party.
    Custom(String),
}

impl CancellationReason {
    /// Parse a reason from a canned code and optional custom text.
    ///
    /// The `custom` code requires non-blank `custom_text`; canned codes
    /// ignore it.
    ///
    /// # Errors
    /// Returns [`ReasonValidationError`] for unknown codes or blank custom
    /// text. Validation happens before any network or database call.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::CancellationReason;
    ///
    /// let reason = CancellationReason::parse("custom", Some("changed my mind"))
    ///     .expect("valid reason");
    /// assert_eq!(reason.as_text(), "changed my mind");
    /// ```
    pub fn parse(
        code: &str,
        custom_text: Option<&str>,
    ) -> Result<Self, ReasonValidationError> {
        match code {
            "change_of_plans" => Ok(Self::ChangeOfPlans),
            "waited_too_long" => Ok(Self::WaitedTooLong),
            "requested_by_mistake" => Ok(Self::RequestedByMistake),
            "custom" => {
                let text = custom_text.map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    return Err(ReasonValidationError::EmptyCustomText);
                }
                Ok(Self::Custom(text.to_owned()))
            }
            other => Err(ReasonValidationError::UnknownCode {
                code: other.to_owned(),
            }),
        }
    }

    /// Reason for administrator-initiated cancellations.
    pub fn admin() -> Self {
        Self::Custom(ADMIN_CANCELLATION_REASON.to_owned())
    }

    /// The text persisted alongside the `cancelled` status.
    pub fn as_text(&self) -> &str {
        match self {
            Self::ChangeOfPlans => "Change of plans",
            Self::WaitedTooLong => "Waited too long for a driver",
            Self::RequestedByMistake => "Requested by mistake",
            Self::Custom(text) => text.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("change_of_plans", "Change of plans")]
    #[case("waited_too_long", "Waited too long for a driver")]
    #[case("requested_by_mistake", "Requested by mistake")]
    fn canned_codes_resolve_to_text(#[case] code: &str, #[case] text: &str) {
        let reason = CancellationReason::parse(code, None).expect("canned code parses");
        assert_eq!(reason.as_text(), text);
    }

    #[rstest]
    fn custom_reason_keeps_trimmed_text() {
        let reason =
            CancellationReason::parse("custom", Some("  changed my mind ")).expect("valid reason");
        assert_eq!(reason.as_text(), "changed my mind");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn custom_reason_requires_text(#[case] text: Option<&str>) {
        assert_eq!(
            CancellationReason::parse("custom", text),
            Err(ReasonValidationError::EmptyCustomText)
        );
    }

    #[rstest]
    fn unknown_code_is_rejected() {
        let error = CancellationReason::parse("weather", None).expect_err("unknown code");
        assert!(error.to_string().contains("weather"));
    }

    #[rstest]
    fn admin_reason_uses_fixed_text() {
        assert_eq!(
            CancellationReason::admin().as_text(),
            ADMIN_CANCELLATION_REASON
        );
    }
}
