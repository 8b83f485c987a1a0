use lengthcalc::{Backend, CalcError, Calculator, Engines, RegisterBank, Settings};
use pretty_assertions::assert_eq;

fn calc_with(backend: Backend) -> Calculator {
    let calc = Calculator::default();
    calc.select_backend(backend).unwrap();
    calc
}

// Malformed input is a parse error on every backend.
#[test]
fn test_malformed_expressions() {
    let regs = RegisterBank::with_latex_defaults();
    for backend in Backend::ALL {
        let calc = calc_with(backend);
        for bad in ["", "1pt +", "(1pt", "1pt)", "3 4", "1zz"] {
            let err = calc.evaluate_length(&regs, bad).unwrap_err();
            assert!(matches!(err, CalcError::Parse(_)), "{backend} `{bad}`: {err}");
        }
    }
}

#[test]
fn test_undefined_references() {
    let regs = RegisterBank::with_latex_defaults();
    for backend in Backend::ALL {
        let calc = calc_with(backend);
        let err = calc.evaluate_length(&regs, "\\nosuchlength + 1pt").unwrap_err();
        assert!(matches!(err, CalcError::UndefinedReference(_)), "{backend}: {err}");
        let err = calc.evaluate_counter(&regs, "\\value{nosuch}").unwrap_err();
        assert!(matches!(err, CalcError::UndefinedReference(_)), "{backend}: {err}");
    }
}

#[test]
fn test_unsupported_backend_keeps_previous() {
    let calc = Calculator::new(Engines { native: false, parser: true });
    calc.select_backend(Backend::Parser).unwrap();
    let before = calc.settings();
    assert_eq!(
        calc.select_backend(Backend::Native),
        Err(CalcError::UnsupportedBackend(Backend::Native))
    );
    assert_eq!(calc.settings(), before);
    assert_eq!(calc.settings().backend, Some(Backend::Parser));
}

#[test]
fn test_engine_unavailable_at_evaluation() {
    let calc = Calculator::with_settings(Settings {
        backend: Some(Backend::Parser),
        engines: Engines { native: true, parser: false },
        ..Settings::default()
    });
    let regs = RegisterBank::new();
    assert_eq!(
        calc.evaluate_counter(&regs, "1"),
        Err(CalcError::EngineUnavailable(Backend::Parser))
    );
}

// With defaulting switched off, unit-requiring backends reject bare numerals.
#[test]
fn test_default_unit_none() {
    let regs = RegisterBank::new();
    for backend in [Backend::Native, Backend::Compat] {
        let calc = calc_with(backend);
        calc.set_default_unit("none");
        let err = calc.evaluate_length(&regs, "12").unwrap_err();
        assert!(matches!(err, CalcError::Parse(_)), "{backend}: {err}");
    }
}

// An unknown default unit is accepted and only fails once used.
#[test]
fn test_bad_default_unit_is_deferred() {
    let calc = Calculator::default();
    calc.set_default_unit("furlong");
    assert_eq!(calc.settings().default_unit, "furlong");
    let regs = RegisterBank::new();
    assert!(calc.evaluate_length(&regs, "2pt").is_ok());
    assert!(matches!(calc.evaluate_length(&regs, "2"), Err(CalcError::Parse(_))));
}

#[test]
fn test_backend_specific_grammar() {
    let regs = RegisterBank::with_latex_defaults();
    let compat = calc_with(Backend::Compat);
    assert!(matches!(
        compat.evaluate_length(&regs, "1pt plus 2pt"),
        Err(CalcError::Parse(_))
    ));
    let native = calc_with(Backend::Native);
    assert!(matches!(
        native.evaluate_length(&regs, "\\textwidth*\\real{0.5}"),
        Err(CalcError::Parse(_))
    ));
    assert!(matches!(native.evaluate_length(&regs, "sqrt(4)"), Err(CalcError::Parse(_))));
}

#[test]
fn test_arithmetic_limits() {
    let regs = RegisterBank::with_latex_defaults();
    for backend in Backend::ALL {
        let calc = calc_with(backend);
        assert!(
            matches!(calc.evaluate_length(&regs, "1pt/0"), Err(CalcError::Arithmetic(_))),
            "{backend}"
        );
        assert!(matches!(
            calc.evaluate_length(&regs, "\\textwidth*100"),
            Err(CalcError::Arithmetic(_))
        ), "{backend}");
        assert!(matches!(
            calc.evaluate_counter(&regs, "2147483647+1"),
            Err(CalcError::Arithmetic(_))
        ), "{backend}");
    }
}

#[test]
fn test_bad_options() {
    let calc = Calculator::default();
    let before = calc.settings();
    for bad in ["backend", "backend=luatex", "units=cm", "overwrite=yes", "defaultunit="] {
        assert!(matches!(calc.configure(bad), Err(CalcError::Config(_))), "{bad}");
    }
    assert_eq!(calc.settings(), before);
}

// Numerals too large for the host are range errors wherever they appear.
#[test]
fn test_oversized_numerals() {
    let regs = RegisterBank::with_latex_defaults();
    let coefficient = "100000000000000000000000000000\\textwidth";
    let literal = "999999999999999999999999999999cc";
    for backend in Backend::ALL {
        let calc = calc_with(backend);
        for expr in [coefficient, literal, "2147483648sp"] {
            let err = calc.evaluate_length(&regs, expr).unwrap_err();
            assert!(matches!(err, CalcError::Arithmetic(_)), "{backend} `{expr}`: {err}");
        }
        let err = calc.evaluate_counter(&regs, "99999999999999999999 - 1").unwrap_err();
        assert!(matches!(err, CalcError::Arithmetic(_)), "{backend}: {err}");
    }
    let compat = calc_with(Backend::Compat);
    assert!(matches!(
        compat.evaluate_counter(&regs, "2000000000*\\real{999999999999999999999999999999}"),
        Err(CalcError::Arithmetic(_))
    ));
}
