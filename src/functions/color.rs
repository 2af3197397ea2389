/// `hsltorgb`: convert an HSL(A) color to an `[r,g,b,a]` array.
///
/// All components are in `0..1`; alpha defaults to `1`.
///
/// ```text
/// color:hsltorgb(0,1,0.5)        # [1,0,0,1]
/// color:hsltorgb(0.5,1,0.5,0.2)  # [0,1,1,0.2]
/// ```
use crate::error::{Result, ScriptError};
use crate::functions::{format_number, parse_number, FunctionArgs, FunctionRegistry, MacroFunction};

pub struct HslToRgb;

impl MacroFunction for HslToRgb {
    fn call(&self, args: &FunctionArgs<'_>) -> Result<String> {
        if !(3..=4).contains(&args.args.len()) {
            return Err(ScriptError::argument(
                args.name,
                format!("expected 3 or 4 arguments (h,s,l[,a]), got {}", args.args.len()),
            ));
        }
        let mut values = [0.0f64, 0.0, 0.0, 1.0];
        for (slot, raw) in values.iter_mut().zip(&args.args) {
            *slot = parse_number(args.name, raw)?;
        }
        let [h, s, l, a] = values;
        let (r, g, b) = hsl_to_rgb(h.rem_euclid(1.0), s.clamp(0.0, 1.0), l.clamp(0.0, 1.0));

        let parts: Vec<String> = [r, g, b, a].iter().map(|v| format_number(round(*v))).collect();
        Ok(format!("[{}]", parts.join(",")))
    }
}

fn round(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register("hsltorgb", HslToRgb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(raw: &str) -> Result<String> {
        HslToRgb.call(&FunctionArgs::new("hsltorgb", raw))
    }

    #[test]
    fn primary_colors() {
        assert_eq!(call("0,1,0.5").unwrap(), "[1,0,0,1]");
        assert_eq!(call("0.5, 1, 0.5, 0.2").unwrap(), "[0,1,1,0.2]");
    }

    #[test]
    fn greyscale_when_unsaturated() {
        assert_eq!(call("0.3,0,0.25").unwrap(), "[0.25,0.25,0.25,1]");
    }

    #[test]
    fn wrong_arity() {
        assert!(call("1,1").is_err());
        assert!(call("1,1,1,1,1").is_err());
    }
}
