// src/analyze/trade.rs
//! Trade-idea synthesis. Without market data the only honest output is a
//! "do not trade" record that keeps the thesis for later review.

use crate::types::{Event, ReasoningPacket, Strategy, TradeIdea};

pub const NO_MARKET_DATA: &str = "market_data_not_configured";

#[derive(Debug, Clone, Copy, Default)]
pub struct TradeBuilder;

impl TradeBuilder {
    pub fn build(&self, packet: &ReasoningPacket, event: &Event) -> Vec<TradeIdea> {
        vec![TradeIdea {
            underlying: event
                .entities
                .first()
                .cloned()
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            strategy: Strategy::None,
            legs: Vec::new(),
            max_loss: 0.0,
            thesis: packet.thesis.clone(),
            time_stop: "N/A".to_string(),
            quality_score: 0.0,
            do_not_trade_reasons: vec![NO_MARKET_DATA.to_string()],
            meta: Default::default(),
        }]
    }
}
