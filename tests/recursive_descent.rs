use lengthcalc::{Backend, Calculator, RegisterBank};
use pretty_assertions::assert_eq;

fn eval_all(expr: &str) -> Vec<String> {
    let regs = RegisterBank::with_latex_defaults();
    Backend::ALL
        .into_iter()
        .map(|backend| {
            let calc = Calculator::default();
            calc.select_backend(backend).unwrap();
            match calc.evaluate_length(&regs, expr) {
                Ok(glue) => glue.to_string(),
                Err(e) => format!("{backend}: {e}"),
            }
        })
        .collect()
}

#[test]
fn test_nested_parentheses() {
    assert_eq!(eval_all("((1pt + 2pt)*3 - (4pt))/5"), vec!["1.0pt"; 3]);
    assert_eq!(eval_all("(((\\textwidth)))"), vec!["345.0pt"; 3]);
}

#[test]
fn test_precedence_and_signs() {
    assert_eq!(eval_all("1pt + 2pt*3"), vec!["7.0pt"; 3]);
    assert_eq!(eval_all("-(-3pt)"), vec!["3.0pt"; 3]);
    assert_eq!(eval_all("10pt - 2pt - 3pt"), vec!["5.0pt"; 3]);
}

#[test]
fn test_coefficients() {
    assert_eq!(eval_all("0.5\\textwidth + 2\\parindent"), vec!["202.5pt"; 3]);
}

#[test]
fn test_glue_on_native() {
    let regs = RegisterBank::with_latex_defaults();
    let calc = Calculator::default();
    let glue = |e: &str| calc.evaluate_length(&regs, e).unwrap().to_string();
    assert_eq!(glue("\\parskip*2"), "0.0pt plus 2.0pt");
    assert_eq!(glue("1pt plus 1fil + 2pt plus 1fill"), "3.0pt plus 1.0fill");
    assert_eq!(glue("(1pt plus 2fil minus 1pt)*2"), "2.0pt plus 4.0fil minus 2.0pt");
    assert_eq!(glue("-(1pt plus 1fil)"), "-1.0pt plus -1.0fil");
}
