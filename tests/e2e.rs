use lengthcalc::{Assign, Backend, Calculator, Engines, RegisterBank, Registers};
use pretty_assertions::assert_eq;

fn article() -> RegisterBank {
    RegisterBank::with_latex_defaults()
}

#[test]
fn test_assign_length_each_backend() {
    for backend in Backend::ALL {
        let calc = Calculator::default();
        calc.select_backend(backend).unwrap();
        let mut regs = article();
        let col = regs.new_length("colwidth");
        calc.assign_length(&mut regs, &col, "(\\textwidth - 25pt)/2").unwrap();
        assert_eq!(regs.length("colwidth").unwrap().to_string(), "160.0pt", "{backend}");
    }
}

#[test]
fn test_add_length_keeps_stretch_on_native() {
    let calc = Calculator::default();
    let mut regs = article();
    let skip = regs.new_length("myskip");
    calc.assign_length(&mut regs, &skip, "\\parskip").unwrap();
    calc.add_length(&mut regs, &skip, "6pt minus 1pt").unwrap();
    assert_eq!(
        regs.length("myskip").unwrap().to_string(),
        "6.0pt plus 1.0pt minus 1.0pt"
    );
}

#[test]
fn test_counters() {
    let calc = Calculator::default();
    let mut regs = article();
    let rows = regs.new_counter("rows");
    calc.assign_counter(&mut regs, &rows, "(\\value{page} + 9) / 4").unwrap();
    // native integer division rounds
    assert_eq!(regs.counter("rows"), Some(3));
    calc.select_backend(Backend::Compat).unwrap();
    calc.assign_counter(&mut regs, &rows, "(\\value{page} + 9) / 4").unwrap();
    assert_eq!(regs.counter("rows"), Some(2));
    calc.add_counter(&mut regs, &rows, "\\value{rows}*10").unwrap();
    assert_eq!(regs.counter("rows"), Some(22));
}

#[test]
fn test_default_unit_for_bare_numerals() {
    let calc = Calculator::default();
    let regs = article();
    assert_eq!(calc.settings().default_unit, "bp");
    calc.set_default_unit("in");
    assert_eq!(calc.evaluate_length(&regs, "1").unwrap().to_string(), "72.27pt");
    assert_eq!(calc.evaluate_length(&regs, "1pt").unwrap().to_string(), "1.0pt");
}

#[test]
fn test_scale_to_unit() {
    let calc = Calculator::default();
    let regs = article();
    let mut out = String::new();
    for backend in Backend::ALL {
        calc.select_backend(backend).unwrap();
        calc.scale_to_unit(&regs, &mut out, "10", "bp").unwrap();
        assert_eq!(out, "9.9626", "{backend}");
    }
}

#[test]
fn test_override_through_installed_host() {
    let calc = Calculator::default();
    let mut bank = article();
    let half = bank.new_length("half");
    let mut host = calc.install(bank);
    calc.configure("overwrite, defaultunit=pt").unwrap();
    host.set_length(&half, "\\textwidth/2").unwrap();
    assert_eq!(host.length("half").unwrap().to_string(), "172.5pt");
    host.add_to_length(&half, "2.5").unwrap();
    assert_eq!(host.length("half").unwrap().to_string(), "175.0pt");
}

#[test]
fn test_compat_only_host() {
    let calc = Calculator::new(Engines { native: false, parser: false });
    let mut regs = article();
    let w = regs.new_length("w");
    calc.assign_length(&mut regs, &w, "\\textwidth*\\ratio{1pt}{3pt}").unwrap();
    assert_eq!(regs.length("w").unwrap().to_string(), "115.0pt");
    assert_eq!(calc.settings().backend, Some(Backend::Compat));
}

#[test]
fn test_global_instance() {
    let regs = article();
    let calc = lengthcalc::global();
    assert!(std::ptr::eq(calc, lengthcalc::global()));
    assert_eq!(calc.evaluate_counter(&regs, "6*7").unwrap(), 42);
}
