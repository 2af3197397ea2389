/// `multpointdefinition`: scale a point definition.
///
/// Takes a JSON array of points and a factor. Every component of each point
/// except the last (the time) is multiplied; anything after the time, such as
/// an easing name, is kept as-is.
///
/// ```text
/// scale:multpointdefinition([[1,1,1,0],[2,2,2,1,"easeInOut"]],2)
/// # [[2,2,2,0],[4,4,4,1,"easeInOut"]]
/// ```
///
/// The factor is the text after the last comma, so this reads
/// [`FunctionArgs::raw`] rather than the comma-split arguments.
use serde_json::Value;

use crate::error::{Result, ScriptError};
use crate::functions::{parse_number, FunctionArgs, FunctionRegistry, MacroFunction};

pub struct MultPointDefinition;

impl MacroFunction for MultPointDefinition {
    fn call(&self, args: &FunctionArgs<'_>) -> Result<String> {
        let (points, factor) = args.raw.rsplit_once(',').ok_or_else(|| {
            ScriptError::argument(args.name, "expected a point definition and a factor")
        })?;
        let factor = parse_number(args.name, factor)?;

        let mut points: Value = serde_json::from_str(points.trim()).map_err(|e| {
            ScriptError::argument(args.name, format!("invalid point definition: {}", e))
        })?;
        let list = points
            .as_array_mut()
            .ok_or_else(|| ScriptError::argument(args.name, "point definition must be an array"))?;

        for point in list.iter_mut() {
            let point = point
                .as_array_mut()
                .ok_or_else(|| ScriptError::argument(args.name, "each point must be an array"))?;
            // The time is the last numeric component.
            let time_at = point
                .iter()
                .rposition(Value::is_number)
                .ok_or_else(|| ScriptError::argument(args.name, "point has no time component"))?;
            for component in &mut point[..time_at] {
                if let Some(n) = component.as_f64() {
                    *component = number(n * factor);
                }
            }
        }

        serde_json::to_string(&points)
            .map_err(|e| ScriptError::argument(args.name, e.to_string()))
    }
}

fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register("multpointdefinition", MultPointDefinition);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn call(raw: &str) -> Result<String> {
        MultPointDefinition.call(&FunctionArgs::new("multpointdefinition", raw))
    }

    #[test]
    fn scales_everything_but_time() {
        assert_eq!(
            call(r#"[[1,1,1,0],[2,2,2,1,"easeInOut"]],2"#).unwrap(),
            r#"[[2,2,2,0],[4,4,4,1,"easeInOut"]]"#
        );
    }

    #[test]
    fn fractional_factor() {
        assert_eq!(call("[[3,0.5]], 0.5").unwrap(), "[[1.5,0.5]]");
    }

    #[test]
    fn rejects_non_arrays() {
        assert!(call("{},2").is_err());
        assert!(call("[1,2],2").is_err());
        assert!(call("[[1,2]]").is_err());
    }
}
