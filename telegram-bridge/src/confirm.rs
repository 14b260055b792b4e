//! Free-text confirmation parsing and pending-signal matching.

use common::{BotConfig, OptionKind, Signal};
use tracing::debug;

/// Structured reading of a confirmed reply. Instrument and option kind are
/// independent and both optional; an unconfirmed reply never produces one
/// of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Canonical instrument key when the reply named one
    pub instrument: Option<String>,
    pub option_kind: Option<OptionKind>,
}

/// Keyword/alias tables compiled from the configuration.
pub struct ReplyParser {
    keywords: Vec<String>,
    instrument_aliases: Vec<(String, String)>,
    option_aliases: Vec<(String, OptionKind)>,
}

impl ReplyParser {
    pub fn new(config: &BotConfig) -> Self {
        let option_aliases = config
            .option_aliases
            .iter()
            .filter_map(|(alias, canonical)| {
                let kind = match canonical.as_str() {
                    "CALL" => OptionKind::Call,
                    "PUT" => OptionKind::Put,
                    _ => return None,
                };
                Some((alias.to_lowercase(), kind))
            })
            .collect();
        Self {
            keywords: config
                .confirmation_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            instrument_aliases: config
                .instrument_aliases
                .iter()
                .map(|(a, c)| (a.to_lowercase(), c.clone()))
                .collect(),
            option_aliases,
        }
    }

    /// Parse an inbound reply. `None` unless the text contains a
    /// confirmation keyword; everything non-confirming is dropped by the
    /// caller. Instrument and option kind are each resolved by the first
    /// alias found as a substring, in table order.
    pub fn parse(&self, text: &str) -> Option<Confirmation> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        if !self.keywords.iter().any(|k| text.contains(k.as_str())) {
            return None;
        }

        let instrument = self
            .instrument_aliases
            .iter()
            .find(|(alias, _)| text.contains(alias.as_str()))
            .map(|(_, canonical)| canonical.clone());

        let option_kind = self
            .option_aliases
            .iter()
            .find(|(alias, _)| text.contains(alias.as_str()))
            .map(|(_, kind)| *kind);

        Some(Confirmation {
            instrument,
            option_kind,
        })
    }
}

/// Insertion-ordered set of signals awaiting a human reply.
///
/// A match removes its signal in the same step, so a signal can never be
/// confirmed twice. Confirmed replies that match nothing are simply
/// discarded by the caller.
#[derive(Debug, Default)]
pub struct PendingSignals {
    signals: Vec<Signal>,
}

impl PendingSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, signal: Signal) {
        debug!("pending signal for {}", signal.instrument);
        self.signals.push(signal);
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Resolve a confirmed reply against the pending set: a named
    /// instrument matches the first pending signal for that instrument;
    /// an unnamed confirmation takes the oldest pending signal. At most
    /// one signal is consumed.
    pub fn take_match(&mut self, confirmation: &Confirmation) -> Option<Signal> {
        let index = match &confirmation.instrument {
            Some(key) => self.signals.iter().position(|s| &s.instrument == key)?,
            None => {
                if self.signals.is_empty() {
                    return None;
                }
                0
            }
        };
        Some(self.signals.remove(index))
    }
}
