//! Evaluation pipeline
//!
//! Wires the pipeline together: history ingestion, context classification,
//! the trailing pass, and the gated entry path. The engine itself is an
//! immutable policy bundle; everything mutable lives in an explicit
//! `SessionState` value threaded through each call, which keeps evaluations
//! deterministic and replayable.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::admission::{AdmissionBlock, TradeAdmissionGate};
use crate::config::Config;
use crate::context::ContextClassifier;
use crate::filters::SignalFilter;
use crate::history::{BoundedBarHistory, HistoryError};
use crate::reaction::{ReactionConfig, ReactionTracker};
use crate::sizing::{PositionSizer, RiskParameters, SizingError};
use crate::trailing::TrailingStopManager;
use crate::{Bar, MarketContext, OpenPosition, OrderIntent, Side, SymbolSpec, TrailingStopIntent};

/// Per-evaluation diagnostics, informational only
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// History shorter than the classifier's window; context is Undefined
    InsufficientData,
    /// A bar arrived older than the stored history and was dropped
    OutOfOrderBar {
        incoming: DateTime<Utc>,
        last: DateTime<Utc>,
    },
    /// An admission precondition failed
    Blocked(AdmissionBlock),
    /// The confirmation filter rejected the context signal
    FilterRejected,
    /// The reaction cycle has not confirmed an entry yet
    AwaitingConfirmation,
    /// Position sizing aborted the trade path
    SizingRejected(SizingError),
}

/// Everything the host supplies for one evaluation
#[derive(Debug)]
pub struct EvaluationInput<'a> {
    /// The newly closed primary-timeframe bar
    pub bar: Bar,
    /// Newly closed higher-timeframe bar, when one exists
    pub higher_bar: Option<Bar>,
    pub bid: f64,
    pub ask: f64,
    pub server_time: DateTime<Utc>,
    pub balance: f64,
    pub positions: &'a [OpenPosition],
    pub spec: &'a SymbolSpec,
}

/// Result of one evaluation
#[derive(Debug)]
pub struct Evaluation {
    pub context: MarketContext,
    pub order: Option<OrderIntent>,
    pub stop_updates: Vec<TrailingStopIntent>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Session-scoped mutable state, exclusively owned by the evaluation loop
#[derive(Debug, Clone)]
pub struct SessionState {
    pub primary: BoundedBarHistory,
    pub higher: BoundedBarHistory,
    pub reaction: ReactionTracker,
    pub last_trade_date: Option<NaiveDate>,
}

/// The decision engine: immutable policies over an explicit session state
pub struct Engine {
    label: String,
    risk: RiskParameters,
    history_capacity: usize,
    classifier: Box<dyn ContextClassifier>,
    filter: Option<Box<dyn SignalFilter>>,
    gate: TradeAdmissionGate,
    sizer: PositionSizer,
    trailing: TrailingStopManager,
    reaction_config: Option<ReactionConfig>,
}

impl Engine {
    pub fn from_config(config: &Config) -> Self {
        Self {
            label: config.label.clone(),
            risk: config.risk,
            history_capacity: config.history_capacity,
            classifier: config.classifier.create(),
            filter: config.filter.as_ref().map(|f| f.create()),
            gate: TradeAdmissionGate::new(config.session.clone()),
            sizer: PositionSizer,
            trailing: TrailingStopManager::new(config.trailing_stop_pips),
            reaction_config: config.reaction,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fresh session state sized for this engine
    pub fn new_session(&self) -> SessionState {
        SessionState {
            primary: BoundedBarHistory::new(self.history_capacity),
            higher: BoundedBarHistory::new(self.history_capacity),
            reaction: ReactionTracker::new(self.reaction_config.unwrap_or_default()),
            last_trade_date: None,
        }
    }

    /// Evaluate one closed bar
    ///
    /// Rejections never corrupt session state: `last_trade_date` is committed
    /// only through [`Engine::record_execution`] once the host confirms the
    /// fill.
    pub fn evaluate(&self, state: &mut SessionState, input: &EvaluationInput) -> Evaluation {
        let mut diagnostics = Vec::new();

        let mut ordered = true;
        if let Err(HistoryError::OutOfOrder { incoming, last }) =
            state.primary.append(input.bar.clone())
        {
            diagnostics.push(Diagnostic::OutOfOrderBar { incoming, last });
            ordered = false;
        }
        if let Some(higher_bar) = &input.higher_bar {
            if let Err(HistoryError::OutOfOrder { incoming, last }) =
                state.higher.append(higher_bar.clone())
            {
                diagnostics.push(Diagnostic::OutOfOrderBar { incoming, last });
            }
        }

        let context = self
            .classifier
            .classify(state.primary.bars(), input.spec);
        if context == MarketContext::Undefined {
            diagnostics.push(Diagnostic::InsufficientData);
        }

        // The trailing pass runs every evaluation, independent of the entry
        // path
        let stop_updates = self.trailing.evaluate(
            input.positions,
            input.bid,
            input.ask,
            input.spec,
            &self.label,
        );

        // The reaction tracker steps every evaluation so context-change
        // resets and timeouts are never missed; gate and filter decide below
        // whether a confirmed signal becomes an order
        let reaction_signal = if self.reaction_config.is_some() && ordered {
            state
                .reaction
                .step(context, state.higher.bars(), &input.bar, input.server_time)
        } else {
            None
        };

        let order = if ordered {
            self.entry_path(state, input, context, reaction_signal, &mut diagnostics)
        } else {
            None
        };

        Evaluation {
            context,
            order,
            stop_updates,
            diagnostics,
        }
    }

    /// Record a host-confirmed execution; consumes the daily trade allowance
    pub fn record_execution(&self, state: &mut SessionState, time: DateTime<Utc>) {
        state.last_trade_date = Some(time.date_naive());
        info!(label = %self.label, date = %time.date_naive(), "trade recorded for the day");
    }

    fn entry_path(
        &self,
        state: &SessionState,
        input: &EvaluationInput,
        context: MarketContext,
        reaction_signal: Option<Side>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<OrderIntent> {
        let Some(side) = context.trend_side() else {
            return None;
        };

        if let Err(block) = self.gate.admit(
            input.server_time,
            state.last_trade_date,
            input.positions,
            &self.label,
            &input.spec.symbol,
        ) {
            debug!(%block, "entry blocked");
            diagnostics.push(Diagnostic::Blocked(block));
            return None;
        }

        if let Some(filter) = &self.filter {
            if !filter.confirms(context, state.primary.bars()) {
                diagnostics.push(Diagnostic::FilterRejected);
                return None;
            }
        }

        if self.reaction_config.is_some() && reaction_signal != Some(side) {
            diagnostics.push(Diagnostic::AwaitingConfirmation);
            return None;
        }

        match self.sizer.size(input.balance, &self.risk, input.spec) {
            Ok(volume) => {
                let intent = OrderIntent {
                    symbol: input.spec.symbol.clone(),
                    side,
                    volume,
                    stop_loss_pips: self.risk.stop_loss_pips,
                    take_profit_pips: self.risk.take_profit_pips,
                    label: self.label.clone(),
                };
                info!(%side, volume, %context, "entry admitted");
                Some(intent)
            }
            Err(err) => {
                debug!(%err, "sizing rejected the trade");
                diagnostics.push(Diagnostic::SizingRejected(err));
                None
            }
        }
    }
}
