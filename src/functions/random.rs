/// `random` / `randomint`: random numbers in a range.
///
/// ```text
/// position:[random(0,4),0,0]     # float in 0 .. 4
/// track:wall_randomint(1,3)      # integer in 1 .. 3 (inclusive)
/// ```
///
/// Both take `min,max`; equal bounds return the bound.
use rand::Rng;

use crate::error::{Result, ScriptError};
use crate::functions::{format_number, parse_number, FunctionArgs, FunctionRegistry, MacroFunction};

fn bounds(args: &FunctionArgs<'_>) -> Result<(f64, f64)> {
    let (min, max) = match (args.arg(0), args.arg(1)) {
        (Some(min), Some(max)) if args.args.len() == 2 => {
            (parse_number(args.name, min)?, parse_number(args.name, max)?)
        }
        _ => {
            return Err(ScriptError::argument(
                args.name,
                format!("expected 2 arguments (min,max), got {}", args.args.len()),
            ))
        }
    };
    if min > max {
        return Err(ScriptError::argument(
            args.name,
            format!("min ({}) is greater than max ({})", min, max),
        ));
    }
    Ok((min, max))
}

pub struct Random;

impl MacroFunction for Random {
    fn call(&self, args: &FunctionArgs<'_>) -> Result<String> {
        let (min, max) = bounds(args)?;
        if min == max {
            return Ok(format_number(min));
        }
        if !(max - min).is_finite() {
            return Err(ScriptError::argument(args.name, "range is too wide"));
        }
        let value = rand::thread_rng().gen_range(min..max);
        Ok(value.to_string())
    }
}

pub struct RandomInt;

impl MacroFunction for RandomInt {
    fn call(&self, args: &FunctionArgs<'_>) -> Result<String> {
        let (min, max) = bounds(args)?;
        let (min, max) = (min.ceil() as i64, max.floor() as i64);
        if min > max {
            return Err(ScriptError::argument(args.name, "range holds no integer"));
        }
        let value = rand::thread_rng().gen_range(min..=max);
        Ok(value.to_string())
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register("random", Random);
    registry.register("randomint", RandomInt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_stays_in_range() {
        for _ in 0..50 {
            let out = Random.call(&FunctionArgs::new("random", "1, 2")).unwrap();
            let value: f64 = out.parse().unwrap();
            assert!((1.0..2.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn randomint_is_inclusive_integer() {
        for _ in 0..50 {
            let out = RandomInt.call(&FunctionArgs::new("randomint", "1,3")).unwrap();
            let value: i64 = out.parse().unwrap();
            assert!((1..=3).contains(&value));
        }
    }

    #[test]
    fn equal_bounds_return_bound() {
        assert_eq!(Random.call(&FunctionArgs::new("random", "4,4")).unwrap(), "4");
        assert_eq!(RandomInt.call(&FunctionArgs::new("randomint", "4,4")).unwrap(), "4");
    }

    #[test]
    fn rejects_bad_arguments() {
        let err = Random.call(&FunctionArgs::new("random", "1")).unwrap_err();
        assert!(err.to_string().contains("expected 2 arguments"));

        let err = RandomInt.call(&FunctionArgs::new("randomint", "x,2")).unwrap_err();
        assert!(err.to_string().contains("'x' is not a valid number"));

        assert!(Random.call(&FunctionArgs::new("random", "3,1")).is_err());
    }

    #[test]
    fn rejects_non_finite_ranges() {
        assert!(Random.call(&FunctionArgs::new("random", "NaN,1")).is_err());
        assert!(Random.call(&FunctionArgs::new("random", "0,inf")).is_err());
        let err = Random.call(&FunctionArgs::new("random", "-1e308,1e308")).unwrap_err();
        assert!(err.to_string().contains("too wide"));
        assert!(RandomInt.call(&FunctionArgs::new("randomint", "NaN,1")).is_err());
    }
}
