//! Serializable backtest configuration.
//!
//! A flat TOML table, e.g.
//!
//! ```toml
//! strategy = "ma_crossover"
//! short_window = 10
//! long_window = 30
//! initial_cash = 100000.0
//! commission = 0.0005
//! ```
//!
//! Strategy parameters that are left out take that strategy's defaults;
//! parameters that belong to a different strategy are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tradelab_core::{EngineConfig, StrategyError, StrategyKind, StrategySpec};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;
pub const DEFAULT_COMMISSION: f64 = 0.0005;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown strategy {0:?} (expected ma_crossover, rsi, bollinger or ma_trend)")]
    UnknownStrategy(String),
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// Which strategy to run. Accepts the legacy class names as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrategyName {
    MaCrossover,
    Rsi,
    Bollinger,
    MaTrend,
}

impl StrategyName {
    pub const ALL: [StrategyName; 4] = [
        StrategyName::MaCrossover,
        StrategyName::Rsi,
        StrategyName::Bollinger,
        StrategyName::MaTrend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyName::MaCrossover => "ma_crossover",
            StrategyName::Rsi => "rsi",
            StrategyName::Bollinger => "bollinger",
            StrategyName::MaTrend => "ma_trend",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ma_crossover" | "MAStrategy" => Ok(StrategyName::MaCrossover),
            "rsi" | "RSIStrategy" => Ok(StrategyName::Rsi),
            "bollinger" | "BollingerBandsStrategy" => Ok(StrategyName::Bollinger),
            "ma_trend" | "Strategy_MA" => Ok(StrategyName::MaTrend),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

impl TryFrom<String> for StrategyName {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StrategyName> for String {
    fn from(name: StrategyName) -> Self {
        name.as_str().to_string()
    }
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub strategy: StrategyName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_window: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_window: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi_period: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oversold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overbought: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bb_period: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bb_dev: Option<f64>,

    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    /// Fraction of notional charged per fill.
    #[serde(default = "default_commission")]
    pub commission: f64,
}

fn default_initial_cash() -> f64 {
    DEFAULT_INITIAL_CASH
}

fn default_commission() -> f64 {
    DEFAULT_COMMISSION
}

/// What actually determines a run; hashed for the run id.
#[derive(Serialize)]
struct Normalized {
    strategy: StrategySpec,
    initial_cash: f64,
    commission: f64,
}

impl BacktestConfig {
    /// Default parameters for `strategy`.
    pub fn new(strategy: StrategyName) -> Self {
        Self {
            strategy,
            short_window: None,
            long_window: None,
            rsi_period: None,
            oversold: None,
            overbought: None,
            bb_period: None,
            bb_dev: None,
            initial_cash: DEFAULT_INITIAL_CASH,
            commission: DEFAULT_COMMISSION,
        }
    }

    /// Flatten a strategy spec back into config keys.
    pub fn from_spec(spec: &StrategySpec, initial_cash: f64, commission: f64) -> Self {
        let mut config = match *spec {
            StrategySpec::MaCrossover {
                short_window,
                long_window,
            } => Self {
                short_window: Some(short_window),
                long_window: Some(long_window),
                ..Self::new(StrategyName::MaCrossover)
            },
            StrategySpec::Rsi {
                rsi_period,
                oversold,
                overbought,
            } => Self {
                rsi_period: Some(rsi_period),
                oversold: Some(oversold),
                overbought: Some(overbought),
                ..Self::new(StrategyName::Rsi)
            },
            StrategySpec::Bollinger { bb_period, bb_dev } => Self {
                bb_period: Some(bb_period),
                bb_dev: Some(bb_dev),
                ..Self::new(StrategyName::Bollinger)
            },
            StrategySpec::MaTrend {
                short_window,
                long_window,
            } => Self {
                short_window: Some(short_window),
                long_window: Some(long_window),
                ..Self::new(StrategyName::MaTrend)
            },
        };
        config.initial_cash = initial_cash;
        config.commission = commission;
        config
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the strategy parameters, filling in that strategy's defaults.
    pub fn strategy_spec(&self) -> StrategySpec {
        match self.strategy {
            StrategyName::MaCrossover => StrategySpec::MaCrossover {
                short_window: self.short_window.unwrap_or(10),
                long_window: self.long_window.unwrap_or(30),
            },
            StrategyName::Rsi => StrategySpec::Rsi {
                rsi_period: self.rsi_period.unwrap_or(14),
                oversold: self.oversold.unwrap_or(30.0),
                overbought: self.overbought.unwrap_or(70.0),
            },
            StrategyName::Bollinger => StrategySpec::Bollinger {
                bb_period: self.bb_period.unwrap_or(20),
                bb_dev: self.bb_dev.unwrap_or(2.0),
            },
            StrategyName::MaTrend => StrategySpec::MaTrend {
                short_window: self.short_window.unwrap_or(5),
                long_window: self.long_window.unwrap_or(20),
            },
        }
    }

    pub fn build_strategy(&self) -> Result<StrategyKind, ConfigError> {
        Ok(self.strategy_spec().build()?)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.initial_cash, self.commission)
    }

    /// Range checks on cash and commission, plus the strategy's own parameter checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::Invalid {
                field: "initial_cash",
                reason: format!("must be positive (got {})", self.initial_cash),
            });
        }
        if !(self.commission.is_finite() && (0.0..1.0).contains(&self.commission)) {
            return Err(ConfigError::Invalid {
                field: "commission",
                reason: format!("must be in [0, 1) (got {})", self.commission),
            });
        }
        self.build_strategy().map(|_| ())
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Hashes the resolved parameters, so a config that spells out the
    /// defaults and one that omits them share an id.
    pub fn run_id(&self) -> RunId {
        let normalized = Normalized {
            strategy: self.strategy_spec(),
            initial_cash: self.initial_cash,
            commission: self.commission,
        };
        let bytes = serde_json::to_vec(&normalized)
            .unwrap_or_else(|_| format!("{:?}", normalized.strategy).into_bytes());
        blake3::hash(&bytes).to_hex().to_string()
    }
}
