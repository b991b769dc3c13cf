//! Trade lifecycle — direction, status labels, and transition guards.
//!
//! The status column is an open label: the MT4 side is free to report
//! closed-state variants we have never seen (e.g. "CLOSED (Manual)"). The
//! known states are modelled as variants so the guards don't depend on ad
//! hoc string checks, with `Other` preserving the open-label behavior.

use std::fmt;

/// Trade direction as reported by the signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Parse the wire/database label. Only "BUY" and "SELL" are legal.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Lifecycle state of a trade.
///
/// SIGNAL → SETUP → ACTIVE → TP/SL hits → closed variants, plus the forced
/// "CLOSED (Reversal)" reachable from any open state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeStatus {
    Signal,
    Setup,
    Active,
    Tp1Hit,
    Tp2Hit,
    Tp3Hit,
    SlHit,
    ClosedReversal,
    /// Any label the signal source invents beyond the known set.
    Other(String),
}

impl TradeStatus {
    pub fn from_label(label: &str) -> Self {
        match label {
            "SIGNAL" => Self::Signal,
            "SETUP" => Self::Setup,
            "ACTIVE" => Self::Active,
            "TP1_HIT" => Self::Tp1Hit,
            "TP2_HIT" => Self::Tp2Hit,
            "TP3_HIT" => Self::Tp3Hit,
            "SL_HIT" => Self::SlHit,
            "CLOSED (Reversal)" => Self::ClosedReversal,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_label(&self) -> &str {
        match self {
            Self::Signal => "SIGNAL",
            Self::Setup => "SETUP",
            Self::Active => "ACTIVE",
            Self::Tp1Hit => "TP1_HIT",
            Self::Tp2Hit => "TP2_HIT",
            Self::Tp3Hit => "TP3_HIT",
            Self::SlHit => "SL_HIT",
            Self::ClosedReversal => "CLOSED (Reversal)",
            Self::Other(label) => label,
        }
    }

    /// Open trades are the ones a new setup on the same symbol supersedes.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Signal | Self::Setup | Self::Active)
    }

    fn tp_rank(&self) -> Option<u8> {
        match self {
            Self::Tp1Hit => Some(1),
            Self::Tp2Hit => Some(2),
            Self::Tp3Hit => Some(3),
            _ => None,
        }
    }

    /// A take-profit has been recorded. Substring match on the label so
    /// free-form variants like "CLOSED (TP3)" stay locked too.
    fn mentions_take_profit(&self) -> bool {
        self.as_label().contains("TP")
    }

    /// The event reports a stop-loss.
    fn is_stop_loss(&self) -> bool {
        self.as_label().contains("SL")
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Outcome of checking an incoming status event against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Persist the new status and recompute points.
    Apply,
    /// Report success to the caller but leave the trade untouched.
    Suppress(SuppressReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Retried delivery of the status the trade is already in.
    Duplicate,
    /// A stale stop-loss must not erase a recorded take-profit.
    ProfitLocked,
    /// Targets are hit in order; an earlier target cannot follow a later one.
    TargetRegression,
}

/// Transition guard for `log_event`.
///
/// External deliveries can repeat and arrive out of order; the guards keep
/// recorded progress monotonic without rejecting the request itself.
pub fn transition(current: &TradeStatus, incoming: &TradeStatus) -> Decision {
    if current == incoming {
        return Decision::Suppress(SuppressReason::Duplicate);
    }

    if current.mentions_take_profit() && incoming.is_stop_loss() {
        return Decision::Suppress(SuppressReason::ProfitLocked);
    }

    if let (Some(current_rank), Some(incoming_rank)) = (current.tp_rank(), incoming.tp_rank()) {
        if incoming_rank < current_rank {
            return Decision::Suppress(SuppressReason::TargetRegression);
        }
    }

    Decision::Apply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_round_trip() {
        for label in [
            "SIGNAL",
            "SETUP",
            "ACTIVE",
            "TP1_HIT",
            "TP2_HIT",
            "TP3_HIT",
            "SL_HIT",
            "CLOSED (Reversal)",
        ] {
            assert_eq!(TradeStatus::from_label(label).as_label(), label);
        }
    }

    #[test]
    fn unknown_labels_survive_round_trip() {
        let status = TradeStatus::from_label("CLOSED (Manual)");
        assert_eq!(status, TradeStatus::Other("CLOSED (Manual)".to_string()));
        assert_eq!(status.as_label(), "CLOSED (Manual)");
    }

    #[test]
    fn open_states() {
        assert!(TradeStatus::Signal.is_open());
        assert!(TradeStatus::Setup.is_open());
        assert!(TradeStatus::Active.is_open());
        assert!(!TradeStatus::Tp1Hit.is_open());
        assert!(!TradeStatus::ClosedReversal.is_open());
    }

    #[test]
    fn duplicate_delivery_is_suppressed() {
        let decision = transition(&TradeStatus::Tp1Hit, &TradeStatus::Tp1Hit);
        assert_eq!(decision, Decision::Suppress(SuppressReason::Duplicate));

        let closed = TradeStatus::from_label("CLOSED (Manual)");
        assert_eq!(
            transition(&closed, &closed),
            Decision::Suppress(SuppressReason::Duplicate)
        );
    }

    #[test]
    fn stale_stop_loss_cannot_erase_take_profit() {
        assert_eq!(
            transition(&TradeStatus::Tp1Hit, &TradeStatus::SlHit),
            Decision::Suppress(SuppressReason::ProfitLocked)
        );
        assert_eq!(
            transition(&TradeStatus::Tp3Hit, &TradeStatus::SlHit),
            Decision::Suppress(SuppressReason::ProfitLocked)
        );
    }

    #[test]
    fn profit_lock_covers_free_form_labels() {
        let partial = TradeStatus::from_label("CLOSED (TP2)");
        assert_eq!(
            transition(&partial, &TradeStatus::SlHit),
            Decision::Suppress(SuppressReason::ProfitLocked)
        );
    }

    #[test]
    fn targets_cannot_regress() {
        assert_eq!(
            transition(&TradeStatus::Tp3Hit, &TradeStatus::Tp1Hit),
            Decision::Suppress(SuppressReason::TargetRegression)
        );
        assert_eq!(
            transition(&TradeStatus::Tp3Hit, &TradeStatus::Tp2Hit),
            Decision::Suppress(SuppressReason::TargetRegression)
        );
        assert_eq!(
            transition(&TradeStatus::Tp2Hit, &TradeStatus::Tp1Hit),
            Decision::Suppress(SuppressReason::TargetRegression)
        );
    }

    #[test]
    fn forward_progress_applies() {
        assert_eq!(
            transition(&TradeStatus::Signal, &TradeStatus::Setup),
            Decision::Apply
        );
        assert_eq!(
            transition(&TradeStatus::Active, &TradeStatus::Tp1Hit),
            Decision::Apply
        );
        assert_eq!(
            transition(&TradeStatus::Tp1Hit, &TradeStatus::Tp2Hit),
            Decision::Apply
        );
        assert_eq!(
            transition(&TradeStatus::Active, &TradeStatus::SlHit),
            Decision::Apply
        );
    }

    #[test]
    fn free_form_close_applies_from_open_state() {
        assert_eq!(
            transition(
                &TradeStatus::Active,
                &TradeStatus::from_label("CLOSED (Manual)")
            ),
            Decision::Apply
        );
    }
}
