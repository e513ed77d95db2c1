//! End-to-end session tests against a scripted toolchain.

mod common;

use common::{FakeRuntime, HOST, ToolScript, ids, session};
use textext_core::embed::{find_previous, TEXTEXT_NS};
use textext_core::{
    Backend, NoPrompt, PromptValues, SessionOptions, SessionOutcome, TextextError,
};
use textext_xml::{SVG_NS, XLINK_NS, XmlDocument, XmlElement, parse};

fn options(text: &str) -> SessionOptions {
    SessionOptions {
        text: Some(text.to_string()),
        ..SessionOptions::default()
    }
}

fn edit_options(id: &str, text: &str) -> SessionOptions {
    SessionOptions {
        ids: ids(&[id]),
        ..options(text)
    }
}

fn inserted_path(outcome: &SessionOutcome) -> &textext_xml::NodePath {
    match outcome {
        SessionOutcome::Inserted { path, .. } | SessionOutcome::Replaced { path, .. } => path,
        other => panic!("expected an embedded object, got {:?}", other),
    }
}

fn embedded<'a>(doc: &'a XmlDocument, outcome: &SessionOutcome) -> &'a XmlElement {
    doc.element(inserted_path(outcome)).unwrap()
}

fn textext_objects(doc: &XmlDocument) -> Vec<&XmlElement> {
    doc.root
        .descendants()
        .filter(|el| el.has_attribute(Some(TEXTEXT_NS), "text"))
        .collect()
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

#[test]
fn test_first_available_backend_is_used() {
    let rt = FakeRuntime::new(ToolScript {
        pdf2svg: false,
        ..ToolScript::default()
    });
    let mut doc = parse(HOST).unwrap();
    let outcome = session(&rt, &Backend::DEFAULT_ORDER)
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap();
    assert!(matches!(
        outcome,
        SessionOutcome::Inserted {
            backend: Backend::PstoeditPlotSvg,
            ..
        }
    ));
}

#[test]
fn test_plot_svg_requires_driver_in_help() {
    let rt = FakeRuntime::new(ToolScript {
        pdf2svg: false,
        plot_svg_driver: false,
        ..ToolScript::default()
    });
    let backend = session(&rt, &Backend::DEFAULT_ORDER).select_backend().unwrap();
    assert_eq!(backend, Backend::SkConvert);
}

#[test]
fn test_skconvert_needs_both_tools() {
    let rt = FakeRuntime::new(ToolScript {
        skconvert: false,
        ..ToolScript::default()
    });
    let result = session(&rt, &[Backend::SkConvert]).select_backend();
    assert!(matches!(result, Err(TextextError::Conversion(_))));
}

#[test]
fn test_explicit_order_is_respected() {
    let rt = FakeRuntime::new(ToolScript::default());
    let chosen = session(&rt, &[Backend::SkConvert, Backend::Pdf2Svg])
        .select_backend()
        .unwrap();
    assert_eq!(chosen, Backend::SkConvert);
    // Probing stops at the first success
    let programs: Vec<_> = rt.calls().into_iter().map(|c| c.program).collect();
    assert_eq!(programs, vec!["pstoedit", "skconvert"]);
}

#[test]
fn test_no_backend_fails_without_mutation() {
    let rt = FakeRuntime::new(ToolScript {
        pdf2svg: false,
        pstoedit: false,
        skconvert: false,
        ..ToolScript::default()
    });
    let mut doc = parse(HOST).unwrap();
    let before = doc.clone();

    let err = session(&rt, &Backend::DEFAULT_ORDER)
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap_err();

    assert_eq!(err.to_string(), "No Latex -> SVG converter available");
    assert_eq!(doc, before);
    assert!(rt.conversion_calls().is_empty());
    assert!(rt.temp_dirs().is_empty());
}

// ---------------------------------------------------------------------------
// Tool invocations
// ---------------------------------------------------------------------------

#[test]
fn test_pdf2svg_pipeline_invocations() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &options("$E=mc^2$"), &mut NoPrompt)
        .unwrap();

    let scratch = rt.temp_dirs()[0].clone();
    let calls = rt.conversion_calls();
    assert_eq!(calls.len(), 2);

    assert_eq!(calls[0].program, "pdflatex");
    assert_eq!(
        calls[0].args,
        vec!["tmp.tex", "-interaction=nonstopmode", "-halt-on-error"]
    );
    assert_eq!(calls[0].cwd.as_deref(), Some(scratch.as_path()));

    assert_eq!(calls[1].program, "pdf2svg");
    assert_eq!(
        calls[1].args,
        vec![
            scratch.join("tmp.pdf").to_string_lossy().into_owned(),
            scratch.join("tmp.svg").to_string_lossy().into_owned(),
            "1".to_string(),
        ]
    );
}

#[test]
fn test_skconvert_pipeline_sets_c_locale_for_skconvert_only() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    session(&rt, &[Backend::SkConvert])
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap();

    let calls = rt.conversion_calls();
    let programs: Vec<_> = calls.iter().map(|c| c.program.as_str()).collect();
    assert_eq!(programs, vec!["pdflatex", "pstoedit", "skconvert"]);

    assert_eq!(&calls[1].args[..2], ["-f", "sk"]);
    assert!(calls[1].args[3].ends_with("tmp.sk"));
    assert_eq!(&calls[1].args[4..], ["-dt", "-ssp", "-psarg", "-r9600x9600"]);
    assert!(calls[1].env.is_empty());

    assert_eq!(calls[2].env, vec![("LC_ALL".to_string(), "C".to_string())]);
}

#[test]
fn test_preamble_is_injected_into_document() {
    let preamble_dir = tempfile::tempdir().unwrap();
    let preamble = preamble_dir.path().join("header.inc");
    std::fs::write(&preamble, "\\usepackage{amsmath}\n").unwrap();

    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let opts = SessionOptions {
        preamble_file: preamble.to_string_lossy().into_owned(),
        ..options("\\begin{align}a&=b\\end{align}")
    };
    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &opts, &mut NoPrompt)
        .unwrap();

    let tex = rt.tex_sources()[0].clone();
    assert!(tex.starts_with("\\documentclass[landscape,a0]{article}\n\\usepackage{amsmath}\n"));
    assert!(tex.contains("\\noindent\n\\begin{align}a&=b\\end{align}\n\\end{document}"));

    let preamble_name = preamble.to_string_lossy().into_owned();
    let group = embedded(&doc, &outcome);
    assert_eq!(
        group.attribute(Some(TEXTEXT_NS), "preamble"),
        Some(preamble_name.as_str())
    );
}

// ---------------------------------------------------------------------------
// Normalization of the embedded fragment
// ---------------------------------------------------------------------------

#[test]
fn test_new_ids_continue_after_host_maximum() {
    let host = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <g id="textext-obj-3"/>
  <g id="textext-obj-7"><path id="textext-obj-bogus"/></g>
  <rect id="glyph0-1"/>
</svg>"#;
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(host).unwrap();
    let existing: Vec<String> = doc
        .root
        .descendants()
        .filter_map(|el| el.id().map(str::to_string))
        .collect();

    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap();

    let group = embedded(&doc, &outcome);
    let new_ids: Vec<_> = group
        .descendants()
        .skip(1)
        .filter_map(|el| el.id())
        .collect();
    assert_eq!(
        new_ids,
        vec![
            "textext-obj-8",
            "textext-obj-9",
            "textext-obj-10",
            "textext-obj-11"
        ]
    );
    assert!(new_ids.iter().all(|id| !existing.iter().any(|e| e.as_str() == *id)));
    // The group itself takes the next free id
    assert_eq!(group.id(), Some("textext-obj-12"));
}

#[test]
fn test_references_follow_renumbering() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap();

    let group = embedded(&doc, &outcome);
    let target_of = |old: &str| -> String {
        // Source ids in pre-order: glyph0-0, glyph0-1, clip1, surface1
        let index = ["glyph0-0", "glyph0-1", "clip1", "surface1"]
            .iter()
            .position(|id| *id == old)
            .unwrap();
        format!("textext-obj-{}", index + 1)
    };

    let use_el = group.find_descendant("use").unwrap();
    assert_eq!(
        use_el.attribute(Some(XLINK_NS), "href"),
        Some(format!("#{}", target_of("glyph0-1")).as_str())
    );
    let surface = group
        .descendants()
        .find(|el| el.id() == Some(target_of("surface1").as_str()))
        .unwrap();
    assert_eq!(
        surface.get_attribute("clip-path"),
        Some(format!("url(#{})", target_of("clip1")).as_str())
    );
}

#[test]
fn test_plot_svg_fragment_gets_svg_namespace_and_flip_transform() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let opts = SessionOptions {
        scale_factor: 2.0,
        ..options("$x$")
    };
    let outcome = session(&rt, &[Backend::PstoeditPlotSvg])
        .run(&mut doc, &opts, &mut NoPrompt)
        .unwrap();

    let group = embedded(&doc, &outcome);
    assert!(group.descendants().all(|el| el.name.namespace.as_deref() == Some(SVG_NS)));
    assert_eq!(
        group.get_attribute("transform"),
        Some("matrix(2.000000,0,0,-2.000000,-400.000000,1500.000000)")
    );

    let written = doc.to_xml_string();
    assert!(written.contains(r#"xmlns:textext="http://www.iki.fi/pav/software/textext/""#));
    assert!(!written.contains(r#"xmlns="""#));
}

#[test]
fn test_output_without_group_is_a_no_op() {
    let rt = FakeRuntime::new(ToolScript {
        plot_svg_output: r#"<svg><path d="M 0 0"/></svg>"#.to_string(),
        ..ToolScript::default()
    });
    let mut doc = parse(HOST).unwrap();
    let before = doc.clone();
    let outcome = session(&rt, &[Backend::PstoeditPlotSvg])
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap();
    assert_eq!(outcome, SessionOutcome::NoFragment);
    assert_eq!(doc, before);
}

// ---------------------------------------------------------------------------
// Round trip and re-editing
// ---------------------------------------------------------------------------

#[test]
fn test_markup_round_trips_through_serialized_document() {
    let markup = "\\begin{align}\n  \\alpha &= \\frac{1}{2} \\\\\n  \\text{größe} &= 'x' \"y\"\n\\end{align}";
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &options(markup), &mut NoPrompt)
        .unwrap();
    let id = embedded(&doc, &outcome).id().unwrap().to_string();

    let reread = parse(&doc.to_xml_string()).unwrap();
    let previous = find_previous(&reread, &ids(&[&id])).unwrap().unwrap();
    assert_eq!(previous.text, markup);
    assert_eq!(previous.preamble_file, "header.inc");
}

#[test]
fn test_replacing_twice_is_idempotent() {
    let rt = FakeRuntime::new(ToolScript::default());
    let session = session(&rt, &[Backend::Pdf2Svg]);
    let mut doc = parse(HOST).unwrap();

    let first = session.run(&mut doc, &options("$a+b$"), &mut NoPrompt).unwrap();
    let id = embedded(&doc, &first).id().unwrap().to_string();

    // The user moves the object around in the editor
    let path = inserted_path(&first).clone();
    doc.element_mut(&path)
        .unwrap()
        .set_attribute(textext_xml::XmlName::local("transform"), "translate(10,20)");

    let snapshot = |doc: &XmlDocument| {
        let el = doc.element(&doc.find_by_id(&id).unwrap()).unwrap().clone();
        (
            el.attribute(Some(TEXTEXT_NS), "text").map(str::to_string),
            el.attribute(Some(TEXTEXT_NS), "preamble").map(str::to_string),
            el.get_attribute("transform").map(str::to_string),
        )
    };

    let second = session
        .run(&mut doc, &edit_options(&id, "$a+b$"), &mut NoPrompt)
        .unwrap();
    assert!(matches!(second, SessionOutcome::Replaced { .. }));
    let after_second = snapshot(&doc);
    let serialized_second = parse(&doc.to_xml_string()).unwrap();

    let third = session
        .run(&mut doc, &edit_options(&id, "$a+b$"), &mut NoPrompt)
        .unwrap();
    assert!(matches!(third, SessionOutcome::Replaced { .. }));
    assert_eq!(snapshot(&doc), after_second);
    assert_eq!(after_second.2.as_deref(), Some("translate(10,20)"));

    assert_eq!(textext_objects(&doc).len(), 1);
    assert_eq!(textext_objects(&serialized_second).len(), 1);
}

#[test]
fn test_replacement_keeps_sibling_position() {
    let host = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:textext="http://www.iki.fi/pav/software/textext/">
  <g id="layer1">
    <g id="eq1" textext:text="x" textext:preamble="header.inc"/>
    <rect id="after"/>
  </g>
</svg>"#;
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(host).unwrap();
    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &edit_options("eq1", "y"), &mut NoPrompt)
        .unwrap();

    let layer = doc.element(&doc.find_by_id("layer1").unwrap()).unwrap();
    let order: Vec<_> = layer.elements().filter_map(|el| el.id()).collect();
    assert_eq!(order, vec!["eq1", "after"]);
    assert_eq!(
        embedded(&doc, &outcome).attribute(Some(TEXTEXT_NS), "text"),
        Some("y")
    );
}

#[test]
fn test_previous_transform_overrides_backend_default() {
    let host = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:textext="http://www.iki.fi/pav/software/textext/">
  <g id="eq1" textext:text="x" textext:preamble="header.inc" transform="matrix(0.5,0,0,0.5,100,40)"/>
</svg>"#;
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(host).unwrap();
    let opts = SessionOptions {
        scale_factor: 3.0,
        ..edit_options("eq1", "x")
    };
    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &opts, &mut NoPrompt)
        .unwrap();
    assert_eq!(
        embedded(&doc, &outcome).get_attribute("transform"),
        Some("matrix(0.5,0,0,0.5,100,40)")
    );
}

#[test]
fn test_legacy_object_is_upgraded_on_edit() {
    let host = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <g id="old" textext="x\n\xc3\xa9" texpreamble="header.inc"/>
</svg>"#;
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(host).unwrap();

    let mut seen = None;
    let mut prompt = |initial: PromptValues| {
        seen = Some(initial.clone());
        Some(initial)
    };
    let outcome = session(&rt, &[Backend::Pdf2Svg])
        .run(
            &mut doc,
            &SessionOptions {
                ids: ids(&["old"]),
                ..SessionOptions::default()
            },
            &mut prompt,
        )
        .unwrap();

    let seen = seen.unwrap();
    assert_eq!(seen.text, "x\né");
    assert_eq!(seen.preamble_file, "header.inc");

    let group = embedded(&doc, &outcome);
    assert_eq!(group.get_attribute("textext"), None);
    assert_eq!(group.attribute(Some(TEXTEXT_NS), "text"), Some("x\\né"));
}

// ---------------------------------------------------------------------------
// Prompt handling
// ---------------------------------------------------------------------------

#[test]
fn test_cancelled_prompt_runs_no_tools() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let before = doc.clone();
    let outcome = session(&rt, &Backend::DEFAULT_ORDER)
        .run(&mut doc, &SessionOptions::default(), &mut NoPrompt)
        .unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(doc, before);
    assert!(rt.conversion_calls().is_empty());
}

#[test]
fn test_prompt_starts_empty_for_new_objects() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let mut prompt = |initial: PromptValues| {
        assert_eq!(initial.text, "");
        assert_eq!(initial.preamble_file, "header.inc");
        assert_eq!(initial.scale_factor, 1.0);
        Some(PromptValues {
            text: "$y$".to_string(),
            ..initial
        })
    };
    let outcome = session(&rt, &[Backend::SkConvert])
        .run(&mut doc, &SessionOptions::default(), &mut prompt)
        .unwrap();
    assert!(outcome.modified());
}

#[test]
fn test_empty_text_is_a_no_op() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let before = doc.clone();
    let outcome = session(&rt, &Backend::DEFAULT_ORDER)
        .run(&mut doc, &options(""), &mut NoPrompt)
        .unwrap();
    assert_eq!(outcome, SessionOutcome::EmptyText);
    assert_eq!(doc, before);
    assert!(rt.conversion_calls().is_empty());
}

#[test]
fn test_invalid_scale_factor_rejected_before_tools_run() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    let opts = SessionOptions {
        scale_factor: 0.0,
        ..options("$x$")
    };
    let err = session(&rt, &[Backend::Pdf2Svg])
        .run(&mut doc, &opts, &mut NoPrompt)
        .unwrap_err();
    assert!(matches!(err, TextextError::InvalidRequest(_)));
    assert!(rt.conversion_calls().is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

fn run_failing(script: ToolScript, backend: Backend) -> (TextextError, std::sync::Arc<FakeRuntime>) {
    let rt = FakeRuntime::new(script);
    let host = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:textext="http://www.iki.fi/pav/software/textext/">
  <g id="eq1" textext:text="x" textext:preamble="header.inc" transform="scale(2)"><path/></g>
</svg>"#;
    let mut doc = parse(host).unwrap();
    let before = doc.clone();
    let err = session(&rt, &[backend])
        .run(&mut doc, &edit_options("eq1", "\\foo"), &mut NoPrompt)
        .unwrap_err();
    assert_eq!(doc, before, "document changed by failed session");
    (err, rt)
}

#[test]
fn test_pdflatex_failure_leaves_document_unchanged() {
    let (err, _) = run_failing(
        ToolScript {
            failing: Some("pdflatex"),
            ..ToolScript::default()
        },
        Backend::Pdf2Svg,
    );
    match err {
        TextextError::ToolExecution { command, code, output } => {
            assert!(command.starts_with("pdflatex tmp.tex"));
            assert_eq!(code, 1);
            assert!(output.contains("! Undefined control sequence."));
        }
        other => panic!("expected tool failure, got {:?}", other),
    }
}

#[test]
fn test_stage_two_failures_leave_document_unchanged() {
    for (program, backend) in [
        ("pdf2svg", Backend::Pdf2Svg),
        ("pstoedit", Backend::PstoeditPlotSvg),
        ("pstoedit", Backend::SkConvert),
        ("skconvert", Backend::SkConvert),
    ] {
        let (err, _) = run_failing(
            ToolScript {
                failing: Some(program),
                ..ToolScript::default()
            },
            backend,
        );
        assert!(
            matches!(&err, TextextError::ToolExecution { command, .. } if command.starts_with(program)),
            "{} / {:?}: {:?}",
            program,
            backend,
            err
        );
    }
}

#[test]
fn test_missing_artifacts_are_conversion_errors() {
    for (program, backend, message) in [
        ("pdflatex", Backend::Pdf2Svg, "pdflatex didn't produce output"),
        ("pdf2svg", Backend::Pdf2Svg, "pdf2svg didn't produce output"),
        ("pstoedit", Backend::PstoeditPlotSvg, "pstoedit didn't produce output"),
        ("pstoedit", Backend::SkConvert, "pstoedit didn't produce output"),
        ("skconvert", Backend::SkConvert, "skconvert didn't produce output"),
    ] {
        let (err, _) = run_failing(
            ToolScript {
                silent: Some(program),
                ..ToolScript::default()
            },
            backend,
        );
        assert_eq!(err.to_string(), message);
    }
}

#[test]
fn test_missing_pdflatex_is_launch_error() {
    let (err, _) = run_failing(
        ToolScript {
            pdflatex: false,
            ..ToolScript::default()
        },
        Backend::Pdf2Svg,
    );
    assert!(matches!(err, TextextError::ToolLaunch { command, .. } if command == "pdflatex"));
}

#[test]
fn test_invalid_converter_output_leaves_document_unchanged() {
    let (err, _) = run_failing(
        ToolScript {
            pdf2svg_output: "<svg><g></svg>".to_string(),
            ..ToolScript::default()
        },
        Backend::Pdf2Svg,
    );
    assert!(matches!(err, TextextError::Xml(_)));
}

// ---------------------------------------------------------------------------
// Scratch directory lifetime
// ---------------------------------------------------------------------------

#[test]
fn test_scratch_directory_removed_after_success() {
    let rt = FakeRuntime::new(ToolScript::default());
    let mut doc = parse(HOST).unwrap();
    session(&rt, &[Backend::SkConvert])
        .run(&mut doc, &options("$x$"), &mut NoPrompt)
        .unwrap();
    let dirs = rt.temp_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists());
}

#[test]
fn test_scratch_directory_removed_after_failure() {
    for failing in ["pdflatex", "pdf2svg"] {
        let (_, rt) = run_failing(
            ToolScript {
                failing: Some(failing),
                ..ToolScript::default()
            },
            Backend::Pdf2Svg,
        );
        let dirs = rt.temp_dirs();
        assert_eq!(dirs.len(), 1);
        assert!(!dirs[0].exists(), "{} left {:?} behind", failing, dirs[0]);
    }
}

#[test]
fn test_each_attempt_gets_a_fresh_scratch_directory() {
    let rt = FakeRuntime::new(ToolScript::default());
    let session = session(&rt, &[Backend::Pdf2Svg]);
    let mut doc = parse(HOST).unwrap();
    session.run(&mut doc, &options("a"), &mut NoPrompt).unwrap();
    session.run(&mut doc, &options("b"), &mut NoPrompt).unwrap();
    let dirs = rt.temp_dirs();
    assert_eq!(dirs.len(), 2);
    assert_ne!(dirs[0], dirs[1]);
    assert!(dirs.iter().all(|d| !d.exists()));
}
