use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit shown when a table carries no `Unit` column.
pub const UNKNOWN_UNIT: &str = "unknown unit";

// ---------------------------------------------------------------------------
// Point3 – a coordinate in input units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Point3) -> Point3 {
        Point3::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Point3::new(x, y, z)
    }
}

// ---------------------------------------------------------------------------
// ComponentKind – which table layout a file follows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Capacitor,
    Resistor,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 2] = [ComponentKind::Capacitor, ComponentKind::Resistor];

    /// Header of the column holding component names.
    pub fn name_column(self) -> &'static str {
        match self {
            ComponentKind::Capacitor => "Capacitor_Name",
            ComponentKind::Resistor => "Resistor_Name",
        }
    }

    /// Every column a table of this kind must provide.
    pub fn required_columns(self) -> [&'static str; 8] {
        [
            self.name_column(),
            "Start_X",
            "Start_Y",
            "Start_Z",
            "End_X",
            "End_Y",
            "End_Z",
            "Value",
        ]
    }

    /// Physical quantity carried by `Value`, e.g. for legend titles.
    pub fn quantity(self) -> &'static str {
        match self {
            ComponentKind::Capacitor => "Capacitance",
            ComponentKind::Resistor => "Resistance",
        }
    }

    /// Capitalised singular, e.g. for window and chart titles.
    pub fn title(self) -> &'static str {
        match self {
            ComponentKind::Capacitor => "Capacitor",
            ComponentKind::Resistor => "Resistor",
        }
    }

    /// The kind a matching overlay table has.
    pub fn other(self) -> Self {
        match self {
            ComponentKind::Capacitor => ComponentKind::Resistor,
            ComponentKind::Resistor => ComponentKind::Capacitor,
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ComponentKind::Capacitor => "capacitors",
            ComponentKind::Resistor => "resistors",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Capacitor => write!(f, "capacitor"),
            ComponentKind::Resistor => write!(f, "resistor"),
        }
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "capacitor" | "c" => Ok(ComponentKind::Capacitor),
            "resistor" | "r" => Ok(ComponentKind::Resistor),
            other => Err(format!("unknown component kind '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Component – one row of a coordinate table
// ---------------------------------------------------------------------------

/// A named capacitor or resistor drawn as a segment between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub start: Point3,
    pub end: Point3,
    /// Capacitance or resistance magnitude; finite and non-negative.
    pub value: f64,
    pub unit: String,
}

impl Component {
    pub fn midpoint(&self) -> Point3 {
        self.start.midpoint(&self.end)
    }
}

// ---------------------------------------------------------------------------
// ComponentTable – the complete loaded file
// ---------------------------------------------------------------------------

/// All components of one loaded file. Replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct ComponentTable {
    pub kind: ComponentKind,
    pub components: Vec<Component>,
    /// Display unit of the whole table (first row's unit).
    pub unit: String,
    /// File the table was read from, if any.
    pub source: Option<PathBuf>,
}

impl ComponentTable {
    pub fn new(kind: ComponentKind, components: Vec<Component>) -> Self {
        let unit = components
            .first()
            .map(|c| c.unit.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| UNKNOWN_UNIT.to_string());
        Self {
            kind,
            components,
            unit,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The value column in row order.
    pub fn values(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.value).collect()
    }

    /// `(min, max)` of the value column, `None` for an empty table.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.components.iter().map(|c| c.value);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// File name of the source, used for titles.
    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, value: f64, unit: &str) -> Component {
        Component {
            name: name.to_string(),
            start: Point3::default(),
            end: Point3::new(1.0, 0.0, 0.0),
            value,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 12.0);
        assert_eq!(a.distance(&b), 13.0);
        assert_eq!(b.distance(&a), 13.0);
    }

    #[test]
    fn table_unit_comes_from_first_row() {
        let table = ComponentTable::new(
            ComponentKind::Capacitor,
            vec![component("C1", 1.0, "fF"), component("C2", 2.0, "pF")],
        );
        assert_eq!(table.unit, "fF");
    }

    #[test]
    fn missing_unit_uses_placeholder() {
        let table = ComponentTable::new(ComponentKind::Resistor, vec![component("R1", 1.0, "")]);
        assert_eq!(table.unit, UNKNOWN_UNIT);
    }

    #[test]
    fn value_range_spans_column() {
        let table = ComponentTable::new(
            ComponentKind::Capacitor,
            vec![
                component("C1", 0.5, "fF"),
                component("C2", 0.1, "fF"),
                component("C3", 0.9, "fF"),
            ],
        );
        assert_eq!(table.value_range(), Some((0.1, 0.9)));
        assert_eq!(
            ComponentTable::new(ComponentKind::Capacitor, Vec::new()).value_range(),
            None
        );
    }

    #[test]
    fn kind_columns_and_parsing() {
        assert_eq!(ComponentKind::Resistor.required_columns()[0], "Resistor_Name");
        assert_eq!("Capacitor".parse::<ComponentKind>(), Ok(ComponentKind::Capacitor));
        assert!("inductor".parse::<ComponentKind>().is_err());
    }
}
