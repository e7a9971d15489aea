//! Trading signal and confidence labels.

use crate::classify::labels;

labels!(
    /// Discrete recommendation for one bar.
    TradingSignal {
        StrongBuy => "strong_buy",
        Buy => "buy",
        StrongSell => "strong_sell",
        Sell => "sell",
        Hold => "hold",
    }
);

impl TradingSignal {
    pub const ALL: [TradingSignal; 5] = [
        Self::StrongBuy,
        Self::Buy,
        Self::StrongSell,
        Self::Sell,
        Self::Hold,
    ];
}

labels!(SignalConfidence {
    High => "high",
    Medium => "medium",
    Low => "low",
});
