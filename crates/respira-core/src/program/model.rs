use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::timer::Phase;

/// A named breathing pattern: per-phase durations and a cycle count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub inhale_seconds: u32,
    /// Zero skips the Pause phase entirely.
    pub pause_seconds: u32,
    pub exhale_seconds: u32,
    pub cycle_count: u32,
    #[serde(default)]
    pub is_built_in: bool,
}

impl Program {
    /// Build a validated user-authored program with a fresh id.
    pub fn custom(
        name: impl Into<String>,
        inhale_seconds: u32,
        pause_seconds: u32,
        exhale_seconds: u32,
        cycle_count: u32,
    ) -> Result<Self, ValidationError> {
        let program = Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            inhale_seconds,
            pause_seconds,
            exhale_seconds,
            cycle_count,
            is_built_in: false,
        };
        program.validate()?;
        Ok(program)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.inhale_seconds == 0 {
            return Err(ValidationError::ZeroDuration { phase: "Inhale" });
        }
        if self.exhale_seconds == 0 {
            return Err(ValidationError::ZeroDuration { phase: "Exhale" });
        }
        if self.cycle_count == 0 {
            return Err(ValidationError::ZeroCycles);
        }
        Ok(())
    }

    /// Seconds in one Inhale -> Pause -> Exhale cycle.
    pub fn cycle_duration(&self) -> u64 {
        u64::from(self.inhale_seconds) + u64::from(self.pause_seconds) + u64::from(self.exhale_seconds)
    }

    /// Seconds for the whole program.
    pub fn total_duration(&self) -> u64 {
        self.cycle_duration()
            .saturating_mul(u64::from(self.cycle_count))
    }

    pub fn phase_duration(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Inhale => self.inhale_seconds,
            Phase::Pause => self.pause_seconds,
            Phase::Exhale => self.exhale_seconds,
        }
    }

    pub fn has_pause(&self) -> bool {
        self.pause_seconds > 0
    }

    /// Display string stored on session records, e.g.
    /// `"Inhale 4s · Pause 7s · Exhale 8s"`.
    pub fn phase_description(&self) -> String {
        let mut parts = vec![format!("Inhale {}s", self.inhale_seconds)];
        if self.has_pause() {
            parts.push(format!("Pause {}s", self.pause_seconds));
        }
        parts.push(format!("Exhale {}s", self.exhale_seconds));
        parts.join(" · ")
    }
}

fn builtin(id: u128, name: &str, inhale: u32, pause: u32, exhale: u32, cycles: u32) -> Program {
    Program {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        inhale_seconds: inhale,
        pause_seconds: pause,
        exhale_seconds: exhale,
        cycle_count: cycles,
        is_built_in: true,
    }
}

/// The fixed set of programs shipped with the engine.
///
/// Ids are stable so an active-program reference persisted in one process
/// still resolves in the next.
pub fn builtin_programs() -> Vec<Program> {
    vec![
        builtin(0xb4ea_7000_0001, "Relaxing Breath", 4, 7, 8, 4),
        builtin(0xb4ea_7000_0002, "Box Breathing", 4, 4, 4, 6),
        builtin(0xb4ea_7000_0003, "Even Breath", 4, 0, 4, 10),
        builtin(0xb4ea_7000_0004, "Coherent Breathing", 5, 0, 5, 12),
        builtin(0xb4ea_7000_0005, "Calming Exhale", 4, 0, 6, 8),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_breath_durations() {
        let p = Program::custom("Even", 4, 0, 4, 10).unwrap();
        assert_eq!(p.cycle_duration(), 8);
        assert_eq!(p.total_duration(), 80);
        assert!(!p.has_pause());
    }

    #[test]
    fn custom_rejects_invalid_durations() {
        assert_eq!(
            Program::custom("x", 0, 0, 4, 1),
            Err(ValidationError::ZeroDuration { phase: "Inhale" })
        );
        assert_eq!(
            Program::custom("x", 4, 2, 0, 1),
            Err(ValidationError::ZeroDuration { phase: "Exhale" })
        );
        assert_eq!(Program::custom("x", 4, 0, 4, 0), Err(ValidationError::ZeroCycles));
        assert_eq!(Program::custom("   ", 4, 0, 4, 1), Err(ValidationError::EmptyName));
    }

    #[test]
    fn phase_description_omits_zero_pause() {
        let with_pause = Program::custom("478", 4, 7, 8, 4).unwrap();
        assert_eq!(with_pause.phase_description(), "Inhale 4s · Pause 7s · Exhale 8s");

        let without = Program::custom("even", 4, 0, 4, 4).unwrap();
        assert_eq!(without.phase_description(), "Inhale 4s · Exhale 4s");
    }

    #[test]
    fn builtins_are_valid_and_flagged() {
        let all = builtin_programs();
        assert_eq!(all.len(), 5);
        for p in &all {
            assert!(p.is_built_in);
            assert!(p.validate().is_ok(), "{} should validate", p.name);
        }
    }

    #[test]
    fn builtin_ids_are_stable_and_unique() {
        let a = builtin_programs();
        let b = builtin_programs();
        let ids: std::collections::HashSet<_> = a.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), a.len());
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let p = Program::custom("Even", 4, 0, 4, 10).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["inhaleSeconds"], 4);
        assert_eq!(json["cycleCount"], 10);
        assert_eq!(json["isBuiltIn"], false);
    }
}
