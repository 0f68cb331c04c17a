//! Message canonicalization
//!
//! Strips run-specific values (timestamps, measured periods, FIFO data,
//! hex literals) so that the same event logged at different times or with
//! different data groups under one message.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TIMESTAMP: Regex = Regex::new(r"@\s*\d+:?").unwrap();
    static ref CLOCK_PERIOD: Regex =
        Regex::new(r"Actual clock period\s*:\s*\d+\.\d+").unwrap();
    static ref ACTUAL_FIFO: Regex = Regex::new(r"Actual Fifo Data\s*:\s*[0-9a-fA-Fx]+").unwrap();
    static ref EXPECTED_FIFO: Regex =
        Regex::new(r"Expected Fifo Data\s*:\s*[0-9a-fA-Fx]+").unwrap();
    static ref HEX_LITERAL: Regex = Regex::new(r"0x[0-9a-fA-F]+").unwrap();
    static ref BARE_INTEGER: Regex = Regex::new(r"\b\d+\b").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Ordered substitution pipeline applied to classified messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageNormalizer {
    /// Also replace bare integers with `N`
    pub collapse_integers: bool,
}

impl MessageNormalizer {
    pub fn new(collapse_integers: bool) -> Self {
        Self { collapse_integers }
    }

    /// Normalize a message. The pipeline is re-run until the text is
    /// stable, so the result is always a fixed point.
    pub fn normalize(&self, message: &str) -> String {
        let mut current = self.pass(message);
        // Extra passes only run when a removal joined fragments into a new token.
        for _ in 0..=message.len() {
            let next = self.pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn pass(&self, message: &str) -> String {
        let msg = TIMESTAMP.replace_all(message, "");
        let msg = CLOCK_PERIOD.replace_all(&msg, "Actual clock period");
        let msg = ACTUAL_FIFO.replace_all(&msg, "Actual Fifo Data");
        let msg = EXPECTED_FIFO.replace_all(&msg, "Expected Fifo Data");
        let msg = HEX_LITERAL.replace_all(&msg, "0xVAL");
        let msg = if self.collapse_integers {
            BARE_INTEGER.replace_all(&msg, "N").into_owned()
        } else {
            msg.into_owned()
        };
        WHITESPACE.replace_all(&msg, " ").trim().to_string()
    }
}

/// Normalize with the default (non integer-collapsing) pipeline
pub fn normalize(message: &str) -> String {
    MessageNormalizer::default().normalize(message)
}
