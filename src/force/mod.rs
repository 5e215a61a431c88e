//! # Force Composition
//!
//! Collapses the force-typed knowns of a problem into one resultant so the
//! derivation search sees a single net force.
//!
//! Each force's angle (radians from the positive x axis, counter-clockwise)
//! is taken from, in order:
//!
//! 1. a number in its direction text (`"30"`, `"30°"`, `"0.5 rad"`),
//!    degrees unless suffixed `rad`;
//! 2. a direction keyword (`down`/`向下`, `up`/`向上`, `right`/`向右`,
//!    `left`/`向左`);
//! 3. its subtype: gravity and weight point down, normal up, friction left,
//!    everything else right.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ForceConfig;
use crate::model::{KnownVariable, FORCE_TYPE};

/// Subtype carried by the synthetic resultant known.
pub const RESULTANT_SUB_TYPE: &str = "resultant";

/// One force resolved into components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceComponent {
    pub name: String,
    pub magnitude: f64,
    /// Direction as given, or a description of `angle` when none was.
    pub direction: String,
    /// Radians from the positive x axis.
    pub angle: f64,
    pub x: f64,
    pub y: f64,
    pub unit: String,
}

impl ForceComponent {
    pub fn from_polar(name: impl Into<String>, magnitude: f64, angle: f64, direction: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            magnitude,
            direction: direction.into(),
            angle,
            x: magnitude * angle.cos(),
            y: magnitude * angle.sin(),
            unit: unit.into(),
        }
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

/// Outcome of composing a problem's forces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceAnalysisResult {
    pub components: Vec<ForceComponent>,
    pub resultant: ForceComponent,
    pub is_equilibrium: bool,
    /// Human-readable report.
    pub description: String,
}

/// Vector-sums force-typed knowns.
#[derive(Debug, Clone, Default)]
pub struct ForceComposer {
    config: ForceConfig,
}

impl ForceComposer {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }

    pub fn contains_forces(knowns: &[KnownVariable]) -> bool {
        knowns.iter().any(KnownVariable::is_force)
    }

    /// Resolve every force known and sum the components. With no forces the
    /// resultant is zero and the system is in equilibrium.
    pub fn compose(&self, knowns: &[KnownVariable]) -> ForceAnalysisResult {
        let unit = self.config.unit.as_str();
        let components: Vec<ForceComponent> = knowns
            .iter()
            .filter(|k| k.is_force())
            .map(|k| {
                let angle = resolve_angle(k.direction.as_deref(), k.sub_type.as_deref());
                let direction = k.direction.clone().unwrap_or_else(|| describe_direction(angle));
                ForceComponent::from_polar(&k.name, k.value, angle, direction, unit)
            })
            .collect();

        let x: f64 = components.iter().map(|c| c.x).sum();
        let y: f64 = components.iter().map(|c| c.y).sum();
        let magnitude = x.hypot(y);
        let angle = y.atan2(x);
        let resultant = ForceComponent {
            name: self.config.resultant_name.clone(),
            magnitude,
            direction: describe_direction(angle),
            angle,
            x,
            y,
            unit: unit.to_string(),
        };
        let is_equilibrium = magnitude < self.config.equilibrium_tolerance;
        let description = report(&components, &resultant, is_equilibrium);

        info!(
            forces = components.len(),
            magnitude,
            direction = %resultant.direction,
            is_equilibrium,
            "forces composed"
        );

        ForceAnalysisResult { components, resultant, is_equilibrium, description }
    }

    /// Replace the force knowns with one resultant known.
    ///
    /// The resultant is only added when it exceeds the equilibrium
    /// tolerance. Non-force knowns keep their order. Returns `None` for the
    /// analysis when there were no forces, leaving `knowns` untouched.
    pub fn substitute(&self, knowns: Vec<KnownVariable>) -> (Vec<KnownVariable>, Option<ForceAnalysisResult>) {
        if !Self::contains_forces(&knowns) {
            return (knowns, None);
        }
        let analysis = self.compose(&knowns);
        let mut out: Vec<KnownVariable> = knowns.into_iter().filter(|k| !k.is_force()).collect();
        if analysis.resultant.magnitude > self.config.equilibrium_tolerance {
            out.push(
                KnownVariable::new(&self.config.resultant_name, analysis.resultant.magnitude, &self.config.unit)
                    .with_kind(FORCE_TYPE)
                    .with_sub_type(RESULTANT_SUB_TYPE)
                    .with_direction(analysis.resultant.direction.clone()),
            );
        }
        (out, Some(analysis))
    }
}

// ============================================================================
// Angles
// ============================================================================

/// Angle of a force in radians, see the module docs for precedence.
pub fn resolve_angle(direction: Option<&str>, sub_type: Option<&str>) -> f64 {
    direction
        .and_then(|d| explicit_angle(d).or_else(|| keyword_angle(d)))
        .unwrap_or_else(|| default_angle(sub_type))
}

/// First number in the text; degrees unless the text mentions `rad`.
fn explicit_angle(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let start = lower.find(|c: char| c.is_ascii_digit())?;
    // Take a sign directly in front of the digits
    let start = match lower[..start].chars().next_back() {
        Some(sign @ ('-' | '−')) => start - sign.len_utf8(),
        _ => start,
    };
    let rest = &lower[start..];
    let end = rest
        .char_indices()
        .skip(1)
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map_or(rest.len(), |(i, _)| i);
    let number: f64 = rest[..end].replace('−', "-").parse().ok()?;

    if lower[start + end..].trim_start().starts_with("rad") {
        Some(number)
    } else {
        Some(number.to_radians())
    }
}

/// English keywords match whole words only; Chinese ones match anywhere.
fn keyword_angle(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |zh: &str, en: &[&str]| lower.contains(zh) || words.iter().any(|w| en.contains(w));
    if has("向下", &["down", "downward", "downwards"]) {
        Some(-FRAC_PI_2)
    } else if has("向上", &["up", "upward", "upwards"]) {
        Some(FRAC_PI_2)
    } else if has("向右", &["right", "rightward", "rightwards"]) {
        Some(0.0)
    } else if has("向左", &["left", "leftward", "leftwards"]) {
        Some(PI)
    } else {
        None
    }
}

fn default_angle(sub_type: Option<&str>) -> f64 {
    match sub_type.map(str::to_lowercase).as_deref() {
        Some("gravity" | "weight") => -FRAC_PI_2,
        Some("normal") => FRAC_PI_2,
        Some("friction") => PI,
        _ => 0.0,
    }
}

/// Plain-language direction of an angle, with 5° snapping to the axes.
pub fn describe_direction(angle: f64) -> String {
    let deg = angle.to_degrees();
    if deg.abs() < 5.0 {
        "horizontal right".into()
    } else if (deg - 90.0).abs() < 5.0 {
        "vertical up".into()
    } else if (deg + 90.0).abs() < 5.0 {
        "vertical down".into()
    } else if (deg.abs() - 180.0).abs() < 5.0 {
        "horizontal left".into()
    } else if deg > 0.0 && deg < 90.0 {
        format!("{deg:.1}° above horizontal")
    } else if deg > 90.0 && deg < 180.0 {
        format!("{:.1}° above horizontal, to the left", 180.0 - deg)
    } else if deg < 0.0 && deg > -90.0 {
        format!("{:.1}° below horizontal", -deg)
    } else {
        format!("{:.1}° below horizontal, to the left", deg + 180.0)
    }
}

fn report(components: &[ForceComponent], resultant: &ForceComponent, is_equilibrium: bool) -> String {
    let unit = &resultant.unit;
    let mut out = String::from("Force analysis:\n");
    for c in components {
        let _ = writeln!(out, "- {}: {:.2} {unit}, {}", c.name, c.magnitude, c.direction);
    }
    out.push_str("\nResultant:\n");
    let _ = writeln!(out, "- x component: {:.2} {unit}", resultant.x);
    let _ = writeln!(out, "- y component: {:.2} {unit}", resultant.y);
    let _ = writeln!(out, "- magnitude: {:.2} {unit}", resultant.magnitude);
    let _ = writeln!(out, "- direction: {}", resultant.direction);
    if is_equilibrium {
        out.push_str("\nThe body is in equilibrium (net force is zero).");
    } else {
        let _ = write!(out, "\nThe body is not in equilibrium; net force {:.2} {unit}.", resultant.magnitude);
    }
    out
}
