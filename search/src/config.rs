use std::fmt;
use std::str::FromStr;

/// Value domain of a tunable option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Spin { min: i32, max: i32 },
    Check,
}

impl OptionKind {
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            OptionKind::Spin { min, max } => {
                let parsed = value
                    .parse::<i32>()
                    .map_err(|e| format!("Invalid integer: {}", e))?;
                if parsed < *min || parsed > *max {
                    return Err(format!("Value {} out of range [{}, {}]", parsed, min, max));
                }
                Ok(())
            }
            OptionKind::Check => match value.to_lowercase().as_str() {
                "true" | "false" => Ok(()),
                _ => Err("Boolean value must be 'true' or 'false'".to_string()),
            },
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Spin { min, max } => write!(f, "spin [{}, {}]", min, max),
            OptionKind::Check => f.write_str("check"),
        }
    }
}

macro_rules! define_config {
    ($(($field:ident: $type:ty, $kind:expr, $default:expr)),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct EngineConfig {
            $(pub $field: ConfigParam<$type>,)*
        }

        impl Default for EngineConfig {
            fn default() -> Self {
                Self {
                    $($field: ConfigParam {
                        value: $default,
                        name: stringify!($field),
                        kind: $kind,
                    },)*
                }
            }
        }

        impl EngineConfig {
            /// Sets an option by its field name, e.g. `set("hash_size", "64")`.
            pub fn set(&mut self, name: &str, value: &str) -> Result<(), String> {
                match name {
                    $(stringify!($field) => self.$field.update(value),)*
                    _ => Err(format!("Unknown parameter: {}", name)),
                }
            }

            /// One line per option: name, kind and current value.
            pub fn describe(&self) -> Vec<String> {
                vec![$(self.$field.describe(),)*]
            }
        }
    };
}

define_config!(
    // Transposition table size in megabytes
    (hash_size: usize, OptionKind::Spin { min: 1, max: 2048 }, 16),

    // Depth used when neither a depth nor a time limit is given
    (default_depth: u8, OptionKind::Spin { min: 1, max: 64 }, 6),

    // Aspiration Windows - Search with tight bounds around expected score
    (aspiration_window_size: i16, OptionKind::Spin { min: 10, max: 100 }, 40), // Initial window size in centipawns
    (aspiration_window_widen: i16, OptionKind::Spin { min: 2, max: 4 }, 2), // Factor to widen window on fail
    (aspiration_window_depth: u8, OptionKind::Spin { min: 1, max: 10 }, 5), // Minimum depth to use aspiration
    (aspiration_window_retries: i16, OptionKind::Spin { min: 1, max: 5 }, 3), // Max retries before full window

    // Root moves within this many centipawns of the best are scored exactly
    (root_tie_margin: i16, OptionKind::Spin { min: 1, max: 200 }, 1),

    // Move ordering (TT move, captures, checks, killers, history)
    (move_ordering: bool, OptionKind::Check, true),

    // History Heuristic - Track move success/failure for ordering
    (history_max_value: i32, OptionKind::Spin { min: 128, max: 1024 }, 512), // Maximum history score (absolute value)
    (history_bonus_multiplier: i32, OptionKind::Spin { min: 0, max: 30 }, 13), // Scaling for successful moves
    (history_malus_multiplier: i32, OptionKind::Spin { min: 0, max: 30 }, 4), // Scaling for failed moves

    // Quiescence Search - SEE and delta pruning, both lossy
    (qs_see_pruning: bool, OptionKind::Check, false),
    (qs_delta_pruning: bool, OptionKind::Check, false),
    (qs_delta_margin: i16, OptionKind::Spin { min: 10, max: 500 }, 200), // Safety margin for delta pruning
);

#[derive(Debug, Clone)]
pub struct ConfigParam<T> {
    pub value: T,
    pub name: &'static str,
    pub kind: OptionKind,
}

impl<T> ConfigParam<T>
where
    T: FromStr + ToString + Clone,
    T::Err: fmt::Display,
{
    pub fn update(&mut self, value: &str) -> Result<(), String> {
        self.kind.validate(value)?;

        let new_value = value
            .to_lowercase()
            .parse::<T>()
            .map_err(|e| format!("Parse error: {}", e))?;

        self.value = new_value;
        Ok(())
    }

    pub fn describe(&self) -> String {
        format!("{} ({}) = {}", self.name, self.kind, self.value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_updates_value() {
        let mut config = EngineConfig::default();
        config.set("hash_size", "64").unwrap();
        assert_eq!(config.hash_size.value, 64);

        config.set("move_ordering", "false").unwrap();
        assert!(!config.move_ordering.value);
    }

    #[test]
    fn set_rejects_out_of_range_and_unknown() {
        let mut config = EngineConfig::default();
        assert!(config.set("hash_size", "0").is_err());
        assert!(config.set("root_tie_margin", "abc").is_err());
        assert!(config.set("no_such_option", "1").is_err());
        assert_eq!(config.hash_size.value, 16);
    }

    #[test]
    fn describe_lists_every_option() {
        let config = EngineConfig::default();
        let lines = config.describe();
        assert!(lines.iter().any(|l| l.starts_with("qs_delta_margin")));
        assert!(lines.iter().any(|l| l == "move_ordering (check) = true"));
    }
}
