/*
 * integration_tests.rs
 * Copyright (c) 2025 CASText contributors
 *
 * End-to-end expansion tests driven by the reference evaluator.
 */

use castext::{
    CasText, ContextMode, ExpandOptions, MatrixParens, MultiplicationSign, RenderOptions,
    Session, Template, parse,
};
use castext_minicas::MiniCas;
use pretty_assertions::assert_eq;

/// Build a seed session from `name:expression` strings.
fn seed(assignments: &[&str]) -> Session {
    let mut session = Session::new();
    for assignment in assignments {
        session.add_assignment(&MiniCas, assignment);
    }
    session
}

fn expand(source: &str, assignments: &[&str]) -> CasText<MiniCas> {
    CasText::new(source, &seed(assignments), MiniCas)
}

fn assert_expands(source: &str, assignments: &[&str], expected: &str) {
    let text = expand(source, assignments);
    assert!(text.is_valid(), "{source}: {}", text.error_summary());
    assert_eq!(text.display(), expected, "{source}");
}

#[test]
fn test_basic_expansion() {
    let a1 = ["a:x^2", "b:(x+1)^2"];
    let cases: &[(&str, &[&str], &str)] = &[
        ("", &[], ""),
        ("Hello world", &[], "Hello world"),
        ("$x^2$", &[], "$x^2$"),
        (r"\[{@x^2@}\]", &[], r"\[{x^2}\]"),
        (r"\(x^2\)", &[], r"\(x^2\)"),
        ("{@x*x^2@}", &[], r"\({x^3}\)"),
        ("{@1+2@}", &[], r"\({3}\)"),
        (r"\[{@a@}+\sin(x)\]", &a1, r"\[{x^2}+\sin(x)\]"),
        (r"\[{@a@}\]", &a1, r"\[{x^2}\]"),
        ("{@a@}", &a1, r"\({x^2}\)"),
        ("{@sin(x)@}", &a1, r"\({\sin \left( x \right)}\)"),
        (r"\[{@a*b@}\]", &a1, r"\[{x^2\cdot \left(x+1\right)^2}\]"),
        ("@", &[], "@"),
        ("{#1+2#}", &[], "3"),
        ("{#sin(x)#}", &[], "sin(x)"),
        ("{#a#}...{#a^2#}", &a1, "x^2...x^4"),
    ];
    for (source, assignments, expected) in cases {
        assert_expands(source, assignments, expected);
    }
}

#[test]
fn test_various_delimiters() {
    for (source, expected) in [
        (r"Inline \({@1+1@}\)", r"Inline \({2}\)"),
        (r"Display \[{@1+1@}\]", r"Display \[{2}\]"),
        ("Implicit inline {@1+1@}", r"Implicit inline \({2}\)"),
    ] {
        let text = expand(source, &[]);
        assert!(text.is_valid());
        assert_eq!(text.display(), expected);
        assert_eq!(text.session().keys(), vec!["autogen0"]);
    }
}

#[test]
fn test_if_block() {
    let a1 = ["a:true", "b:is(1>2)"];
    assert_expands(r#"[[ if test="a" ]]ok[[/ if ]]"#, &a1, "ok");
    assert_expands(r#"[[ if test="b" ]]ok[[/ if ]]"#, &a1, "");
    assert_expands(
        r#"[[ if test="a" ]][[ if test="a" ]]ok[[/ if ]][[/ if ]]"#,
        &a1,
        "ok",
    );
    assert_expands(
        r#"[[ if test="a" ]][[ if test="b" ]]ok[[/ if ]][[/ if ]]"#,
        &a1,
        "",
    );
    assert_expands(r#"[[if test="is(1>2)"]]ok[[/if]]"#, &[], "");
}

#[test]
fn test_if_block_missing_test() {
    let text = expand(
        r#"[[ if test="a" ]][[ if ]]ok[[/ if ]][[/ if ]]"#,
        &["a:true", "b:is(1>2)"],
    );
    assert!(!text.is_valid());
    assert_eq!(text.display(), "");
    insta::assert_snapshot!("if_block_missing_test", text.error_summary());
}

#[test]
fn test_define_block() {
    assert_expands(r#"{#a#} [[ define a="1" /]]{#a#}"#, &["a:2"], "2 1");
    assert_expands(r#"{#a#} [[ define a="a^2" /]]{#a#}"#, &["a:2"], "2 4");
}

#[test]
fn test_define_block_binds_in_order() {
    let text = expand(r#"[[define b="2" c="b+1" /]]{#c#}"#, &[]);
    assert_eq!(text.display(), "3");
    assert_eq!(text.all_raw_expressions(), vec!["b:2", "c:b+1", "c"]);
}

#[test]
fn test_foreach_block() {
    let a1 = ["a:[1,2,3]", "b:{4,5,6,7}"];
    // The iteration variable shadows the list it iterates over.
    assert_expands(
        r#"{#a#} [[ foreach a="a" ]]{#a#},[[/foreach]]"#,
        &a1,
        "[1,2,3] 1,2,3,",
    );
    assert_expands(r#"[[ foreach a="b" ]]{#a#},[[/foreach]]"#, &a1, "4,5,6,7,");
    assert_expands(
        r#"[[ foreach o="[[1,2],[3,4]]" ]]{[[ foreach k="o" ]]{#k#},[[/ foreach ]]}[[/foreach]]"#,
        &a1,
        "{1,2,}{3,4,}",
    );
}

#[test]
fn test_parallel_foreach() {
    assert_expands(
        r#"[[foreach I="[1,2,3]" K="[4,5,6]"]]{#I#},{#K#},[[/foreach]]"#,
        &[],
        "1,4,2,5,3,6,",
    );
}

#[test]
fn test_parallel_foreach_length_mismatch() {
    let text = expand(
        r#"[[foreach I="a" K="b"]]{#I#},{#K#},[[/foreach]]"#,
        &["a:[1,2,3]", "b:{4,5,6,7}"],
    );
    assert!(!text.is_valid());
    assert_eq!(text.display(), "");

    let errors = text.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code.as_deref(), Some("C-3-4"));
    let details: Vec<&str> = errors[0].details.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(details, vec!["`I` has 3 elements", "`K` has 4 elements"]);

    // Each detail points at the variable it describes.
    let starts: Vec<usize> = errors[0]
        .details
        .iter()
        .filter_map(|d| d.location.as_ref().map(|l| l.start_offset()))
        .collect();
    assert_eq!(starts.len(), 2);
    assert!(starts[0] < starts[1]);
    let tag_end = r#"[[foreach I="a" K="b"]]"#.len();
    assert!(starts.iter().all(|start| *start < tag_end));
}

#[test]
fn test_last_iteration_value_persists() {
    assert_expands(
        r#"[[foreach k="[1,2,3]"]][[/foreach]]{#k#}"#,
        &[],
        "3",
    );
}

#[test]
fn test_redefine_variables() {
    assert_expands(
        r"Let \(n\) be defined by \({@n:3@}\). Now add one to get \({@n:n+1@}\) and square the result \({@n:n^2@}\).",
        &[],
        r"Let \(n\) be defined by \({3}\). Now add one to get \({4}\) and square the result \({16}\).",
    );
}

#[test]
fn test_auto_generated_key_names() {
    let text = expand("This is some text {@x^2@}, {@x^3@}", &["a:x^2", "autogen0:x^3"]);
    assert!(text.is_valid());
    assert_eq!(
        text.session().keys(),
        vec!["a", "autogen0", "autogen1", "autogen2"]
    );

    let text = expand("{@x^2@}, {@x^3@}", &["a:x^2"]);
    assert_eq!(text.session().keys(), vec!["a", "autogen0", "autogen1"]);
}

#[test]
fn test_block_bindings_leave_the_key_list() {
    let text = expand(
        r#"{@x@}[[if test="true"]]{@y@}[[/if]]{@z@}"#,
        &[],
    );
    assert_eq!(text.session().keys(), vec!["autogen0", "autogen1", "autogen2"]);
    assert_eq!(text.all_raw_expressions(), vec!["x", "true", "y", "z"]);
}

#[test]
fn test_not_confused_by_pluginfile() {
    let text = expand("Here {@x@} is some @@PLUGINFILE@@ {@x + 1@} some input", &[]);
    assert!(text.is_valid());
    assert_eq!(text.template().raw_expressions(), vec!["x", "x + 1"]);
    assert_eq!(
        text.display(),
        r"Here \({x}\) is some @@PLUGINFILE@@ \({x+1}\) some input"
    );
}

#[test]
fn test_not_confused_by_pluginfile_real_example() {
    let real = r#"<p><img style="display: block; margin-left: auto; margin-right: auto;" src="@@PLUGINFILE@@/inclined-plane.png" alt="" width="164" height="117" /></p>"#;
    let text = expand(real, &[]);
    assert!(text.is_valid());
    assert!(text.template().raw_expressions().is_empty());
    assert_eq!(text.display(), real);
}

#[test]
fn test_raw_expressions() {
    let template = Template::compile("Take {@x^2+2*x@} and then {@sin(z^2)@}.", ContextMode::Teacher);
    assert_eq!(template.raw_expressions(), vec!["x^2+2*x", "sin(z^2)"]);

    let template = Template::compile(
        r#"Take {@x^2+2*x@} and then [[ if test="true"]]{@sin(z^2)@}[[/if]]."#,
        ContextMode::Teacher,
    );
    assert_eq!(template.raw_expressions(), vec!["x^2+2*x", "true", "sin(z^2)"]);

    let template = Template::compile("Take some text without cas commands.", ContextMode::Teacher);
    assert!(template.raw_expressions().is_empty());
}

#[test]
fn test_raw_expressions_unroll_foreach() {
    let text = expand(
        r#"Take {@x^2+2*x@} and then [[ foreach t="[1,2,3]"]]{@t@}[[/foreach]]."#,
        &[],
    );
    assert_eq!(
        text.all_raw_expressions(),
        vec!["x^2+2*x", "[1,2,3]", "1", "t", "2", "t", "3", "t"]
    );
}

#[test]
fn test_raw_expressions_include_seed() {
    let text = expand(
        "Take {@ 1/(1+x^2) @} and then {@sin(z^2)@}.",
        &["p:diff(sans)", "q=int(tans)"],
    );
    assert_eq!(
        text.all_raw_expressions(),
        vec!["p:diff(sans)", "q=int(tans)", "1/(1+x^2)", "sin(z^2)"]
    );
}

#[test]
fn test_check_external_forbidden_words() {
    let seeded = ["a:x^2)", "b:(sin(x)+1)^2"];
    let cases: &[(&str, bool, &[&str])] = &[
        ("", false, &[]),
        (r"$\sin(x)$", false, &[]),
        (r"$\cos(x)$", false, &["cos"]),
        ("{@cos(x)@}", true, &["cos"]),
        // The seed session already uses sin.
        (r"$\cos(x)$", true, &["sin"]),
    ];
    for (source, expected, words) in cases {
        let text = expand(source, &seeded);
        assert_eq!(
            text.check_external_forbidden_words(*words),
            *expected,
            "{source} with {words:?}"
        );
    }
}

#[test]
fn test_fact_sheets() {
    let text = expand("[[facts:calc_diff_linearity_rule]]", &[]);
    assert!(text.is_valid());
    assert!(text.display().contains("Linearity of differentiation"));
    assert!(text.session().is_empty());
}

#[test]
fn test_unknown_fact_sheet() {
    let text = expand("Before [[facts:no_such_sheet]] after", &[]);
    assert!(!text.is_valid());
    assert_eq!(text.display(), "Before  after");
    assert_eq!(text.errors()[0].code.as_deref(), Some("C-5-1"));
}

#[test]
fn test_matrix_parens() {
    let matrix = ["A:matrix([1,2],[1,1])", "A[1,2]:3"];
    assert_expands(
        "{@A@}",
        &matrix,
        r"\({\left[\begin{array}{cc} 1 & 3 \\ 1 & 1 \end{array}\right]}\)",
    );

    let cases = [
        (
            MatrixParens::Parentheses,
            r"\({\left(\begin{array}{cc} 1 & 3 \\ 1 & 1 \end{array}\right)}\)",
        ),
        (
            MatrixParens::None,
            r"\({\begin{array}{cc} 1 & 3 \\ 1 & 1 \end{array}}\)",
        ),
    ];
    for (parens, expected) in cases {
        let mut session = Session::with_options(RenderOptions::default().with_matrix_parens(parens));
        for assignment in matrix {
            session.add_assignment(&MiniCas, assignment);
        }
        let text = CasText::new("{@A@}", &session, MiniCas);
        assert_eq!(text.display(), expected);
    }
}

#[test]
fn test_element_assignment() {
    let text = expand(
        "{@B[2,1]:0@}, {#B#}, {#L#}",
        &["B:matrix([1,2],[3,4])", "L:[1,2,3]", "L[3]:x"],
    );
    assert!(text.is_valid(), "{}", text.error_summary());
    assert_eq!(
        text.display(),
        r"\({\left[\begin{array}{cc} 1 & 2 \\ 0 & 4 \end{array}\right]}\), matrix([1,2],[0,4]), [1,2,x]"
    );
    assert_eq!(text.session().keys(), vec!["B", "L", "autogen0", "autogen1"]);
    assert_eq!(
        text.all_raw_expressions(),
        vec!["B:matrix([1,2],[3,4])", "L:[1,2,3]", "L[3]:x", "B[2,1]:0", "B", "L"]
    );

    let text = expand("{@B[3,1]:0@}", &["B:matrix([1,2],[3,4])"]);
    assert!(!text.is_valid());
    assert_eq!(text.errors()[0].code.as_deref(), Some("C-3-1"));
}

#[test]
fn test_plot() {
    let text = expand("This is some text {@plot(p, [x,-2,3])@}", &["p:x^3"]);
    assert!(text.is_valid(), "{}", text.error_summary());
    assert_eq!(text.session().keys(), vec!["p", "autogen0"]);
    assert!(text.display().starts_with("This is some text <img src='plots/plot-"));
    assert!(
        text.display()
            .ends_with(".png' alt='Auto-generated plot of x^3 with parameters [[x,-2,3]]' />")
    );
}

#[test]
fn test_plot_alt_text() {
    let text = expand(
        r#"This is some text {@plot(p, [x,-2,3], [alt,"Hello World!"])@}"#,
        &["p:sin(x)"],
    );
    assert!(text.is_valid(), "{}", text.error_summary());
    assert_eq!(text.session().keys(), vec!["p", "autogen0"]);
    assert!(text.display().ends_with(".png' alt='Hello World!' />"));
}

#[test]
fn test_plot_alt_text_error() {
    let text = expand("This is some text {@plot(p,[x,-2,3],[alt,x])@}", &["p:sin(x)"]);
    assert!(text.is_valid());
    assert_eq!(text.display(), "This is some text ");
    assert_eq!(text.session().keys(), vec!["p", "autogen0"]);

    let warning = &text.diagnostics()[0];
    assert_eq!(warning.code.as_deref(), Some("C-5-2"));
    assert!(
        warning
            .to_text(None)
            .contains("Plot error: the alt tag definition must be a string, but is not.")
    );
    assert!(warning.to_text(None).contains("The plot call was `plot(sin(x),[x,-2,3],[alt,x])`"));
}

#[test]
fn test_plot_option_error() {
    let text = expand(r#"This is some text {@plot(x^2,[x,-2,3],[notoption,""])@}"#, &[]);
    assert!(text.is_valid());
    assert_eq!(text.session().keys(), vec!["autogen0"]);
    assert!(
        text.diagnostics()[0]
            .to_text(None)
            .contains("Plot error: the following plot options are not supported: notoption.")
    );
}

#[test]
fn test_multiplication_options() {
    let cases = [
        (
            MultiplicationSign::Dot,
            r"Some text \({a\cdot \sin \left( 2\cdot x \right)}\)",
        ),
        (
            MultiplicationSign::Cross,
            r"Some text \({a\times \sin \left( 2\times x \right)}\)",
        ),
        (
            MultiplicationSign::None,
            r"Some text \({a\,\sin \left( 2\,x \right)}\)",
        ),
    ];
    for (sign, expected) in cases {
        let session = Session::with_options(RenderOptions::default().with_multiplication_sign(sign));
        let text = CasText::new(r"Some text \({@a*sin(2*x)@}\)", &session, MiniCas);
        assert!(text.is_valid());
        assert_eq!(text.session().keys(), vec!["autogen0"]);
        assert_eq!(text.display(), expected);
    }
}

#[test]
fn test_math_environment_delimiters() {
    assert_expands(
        r"\begin{align*} x & = {@a@}+1 \ & = {@a+1@} \end{align*}",
        &["a:2"],
        r"\begin{align*} x & = {2}+1 \ & = {3} \end{align*}",
    );
}

#[test]
fn test_currency() {
    assert_expands(
        r"This is system cost \$100,000 to create.",
        &[],
        r"This is system cost \$100,000 to create.",
    );
}

#[test]
fn test_options_from_toml() {
    let options: ExpandOptions = toml::from_str(
        r#"
        mode = "student"
        forbidden-words = ["sin"]
        "#,
    )
    .unwrap();
    let text = CasText::with_options("{@sin(x)@}", &Session::new(), MiniCas, options);
    assert_eq!(text.template().mode(), ContextMode::Student);
    assert!(!text.is_valid());
    assert_eq!(text.errors()[0].code.as_deref(), Some("C-4-2"));
}

#[test]
fn test_parse_is_idempotent() {
    let source = r#"A {@x@} [[foreach k="[1,2]"]][[if test="k>1"]]{#k#}[[/if]][[/foreach]] \[{@y@}\]"#;
    let first = parse(source, ContextMode::Teacher).unwrap();
    let second = parse(source, ContextMode::Teacher).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_expansion_order_is_document_order() {
    let text = expand(
        r#"{@n:1@}[[if test="true"]]{@n:n+1@}[[foreach k="[1,2]"]]{@n:n*10@}[[/foreach]][[/if]]{#n#}"#,
        &[],
    );
    assert_eq!(
        text.display(),
        r"\({1}\)\({2}\)\({20}\)\({200}\)200"
    );
}
