use pretty_assertions::assert_eq;

use wallscript::{
    FunctionArgs, FunctionRegistry, Resolver, ResolverConfig, Scope, ScriptError, Strategy,
    Variable,
};

fn double(args: &FunctionArgs<'_>) -> wallscript::Result<String> {
    let n: i64 = args
        .raw
        .trim()
        .parse()
        .map_err(|_| {
            ScriptError::argument(args.name, format!("'{}' is not an integer", args.raw))
        })?;
    Ok((n * 2).to_string())
}

fn resolver() -> Resolver {
    let mut functions = FunctionRegistry::with_builtins();
    functions.register("double", double);
    Resolver::new(functions)
}

#[test]
fn plain_text_is_a_fixed_point() {
    let globals = [Variable::new("speed", "3")];
    let scope = Scope::new(&[], &globals);
    for input in ["[0,0,0]", "Default", "left wall track", ""] {
        assert_eq!(resolver().resolve(input, &scope).unwrap(), input);
    }
}

#[test]
fn composition_of_all_three() {
    let globals = [Variable::new("width", "3"), Variable::new("half", "{width/2.0}")];
    let scope = Scope::new(&[], &globals);
    let out = resolver().resolve("[double({width+1}),half,{double(2)*10}]", &scope).unwrap();
    assert_eq!(out, "[8,1.5,40]");
}

#[test]
fn builtins_resolve_inside_math() {
    let out = resolver().resolve("{randomint(2,2)+hsltorgb(0,0,1)}", &Scope::default());
    // hsltorgb returns an array, which is not a number
    assert!(out.is_err());

    let out = resolver()
        .resolve("multpointdefinition([[1,0],[2,1]],{1+2})", &Scope::default())
        .unwrap();
    assert_eq!(out, "[[3,0],[6,1]]");
}

#[test]
fn errors_name_the_failing_strategy() {
    let err = resolver().resolve("double(abc)", &Scope::default()).unwrap_err();
    assert_eq!(err.strategy(), Some(Strategy::Functions));
    assert!(err.innermost().to_string().contains("'abc' is not an integer"));

    let err = resolver().resolve("{1+*}", &Scope::default()).unwrap_err();
    assert_eq!(err.strategy(), Some(Strategy::Math));
}

#[test]
fn unbalanced_span_fails_unless_lenient() {
    let strict = resolver();
    assert!(matches!(
        strict.resolve("{2+", &Scope::default()),
        Err(ScriptError::MalformedBracket { .. })
    ));

    let lenient = resolver().with_config(ResolverConfig::default().lenient(true));
    assert_eq!(lenient.resolve("{2+", &Scope::default()).unwrap(), "{2+");
}

#[test]
fn cyclic_variables_report_instead_of_hanging() {
    let globals = [Variable::new("a", "b+1"), Variable::new("b", "a+1")];
    let config = ResolverConfig { max_passes: 16, ..ResolverConfig::default() };
    let err = resolver()
        .with_config(config)
        .resolve("a", &Scope::new(&[], &globals))
        .unwrap_err();
    assert!(matches!(err, ScriptError::DidNotConverge { limit: 16, .. }));
}
