use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use indoc::indoc;
use jsxstyle_extract::{
  extract_styles, CacheState, ClassNamingMode, ExtractError, ExtractOptions, ExtractOutput,
  LiteMode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const FILE: &str = "test/file.jsx";

fn extract_with(source: &str, options: &ExtractOptions) -> ExtractOutput {
  let mut cache = CacheState::new();
  extract_styles(source, FILE, &mut cache, options).unwrap()
}

fn extract(source: &str) -> ExtractOutput {
  extract_with(source, &ExtractOptions::default())
}

/// Collapse whitespace so assertions do not depend on printer layout.
fn squash(code: &str) -> String {
  code
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .replace(" />", "/>")
}

fn assert_js(output: &ExtractOutput, expected: &str) {
  assert_eq!(squash(&output.js), squash(expected));
}

#[test]
fn static_block_becomes_a_div() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    <Block staticInt={69} />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className="_x0"/>;
    "#,
  );
  assert_eq!(
    output.css,
    indoc! {"
      /* test/file.jsx:2 (Block) */
      ._x0 {
        display:block;
        static-int:69px;
      }
    "}
  );
  assert_eq!(
    output.css_file_name.as_deref(),
    Some("test/file.jsxstyle.css")
  );
  assert!(output.warnings.is_empty());
}

#[test]
fn ternaries_split_into_variant_classes() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    <Block color={dynamic ? "red" : "blue"} />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className={(dynamic ? "_x1" : "_x2") + " _x0"}/>;
    "#,
  );
  assert_eq!(
    output.css,
    indoc! {"
      /* test/file.jsx:2 (Block) */
      ._x0 {
        display:block;
      }
      /* test/file.jsx:2 (Block) */
      ._x1 {
        color:red;
      }
      /* test/file.jsx:2 (Block) */
      ._x2 {
        color:blue;
      }
    "}
  );
}

#[test]
fn props_sharing_a_condition_share_a_variant() {
  let output = extract(indoc! {r#"
    import { Box } from "jsxstyle";
    <Box color={active ? "red" : "blue"} margin={active && 4} />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className={active ? "_x0" : "_x1"}/>;
    "#,
  );
  assert!(output.css.contains("._x0 {\n  color:red;\n  margin:4px;\n}\n"));
  assert!(output.css.contains("._x1 {\n  color:blue;\n}\n"));
}

#[test]
fn conditions_with_side_effects_are_not_merged() {
  let output = extract(indoc! {r#"
    import { Box } from "jsxstyle";
    <Box color={f() ? "red" : "blue"} margin={f() ? 1 : 2} />;
  "#});

  let js = squash(&output.js);
  assert_eq!(js.matches("f() ?").count(), 2, "{js}");
  assert!(output.css.contains("color:red;\n}\n"), "{}", output.css);
  assert!(output.css.contains("margin:1px;\n}\n"), "{}", output.css);
}

#[test]
fn inequality_conditions_are_normalized() {
  let output = extract(indoc! {r#"
    import { Box } from "jsxstyle";
    <Box color={mode !== "dark" ? "black" : "white"} />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className={mode === "dark" ? "_x0" : "_x1"}/>;
    "#,
  );
  assert!(output.css.contains("._x0 {\n  color:white;\n}\n"));
}

#[test]
fn identical_declarations_share_one_block() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    <Block staticThing="wow" />;
    <Block
      staticThing="wow"
    />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className="_x0"/>;
      <div className="_x0"/>;
    "#,
  );
  assert_eq!(
    output.css,
    indoc! {"
      /* test/file.jsx:2 (Block) */
      /* test/file.jsx:3-5 (Block) */
      ._x0 {
        display:block;
        static-thing:wow;
      }
    "}
  );
}

#[test]
fn spreads_freeze_what_follows() {
  let source = indoc! {r#"
    import { Block } from "jsxstyle";
    <Block {...props} color="red" />;
  "#};
  let output = extract(source);

  assert_eq!(output.js, source);
  assert_eq!(output.css, "");
  assert_eq!(output.css_file_name, None);
}

#[test]
fn partial_extraction_keeps_runtime_classes_from_spreads() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    <Block color="red" {...rest} width={size} />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      import { Block } from "jsxstyle";
      <Block {...rest} width={size} className={(typeof rest === "object" && rest !== null && rest.className || "") + " _x0"}/>;
    "#,
  );
  assert!(output.css.contains("._x0 {\n  color:red;\n}\n"));
  assert!(!output.css.contains("display:block"));
}

#[test]
fn existing_class_names_are_combined() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    <Block className="cool" color={dynamic ? null : "red"} />;
    <Block className={wow} margin={8} />;
  "#});

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className={"cool " + (dynamic ? "" : "_x1") + " _x0"}/>;
      <div className={(wow || "") + " _x2"}/>;
    "#,
  );
}

#[test]
fn non_rereadable_spreads_leave_the_element_alone() {
  let source = indoc! {r#"
    import { Block } from "jsxstyle";
    <Block color="red" {...getProps()} />;
  "#};
  let output = extract(source);
  assert_eq!(output.js, source);
  assert_eq!(output.css, "");
}

#[test]
fn pseudo_classes_media_queries_and_units() {
  let options = ExtractOptions {
    media_queries: IndexMap::from([("sm".to_string(), "screen and (min-width: 640px)".to_string())]),
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      import { Box } from "jsxstyle";
      <Box hoverColor="red" smMargin={0} placeholderColor="gray" opacity={0.5} WebkitTransition="none" />;
    "#},
    &options,
  );

  assert_eq!(
    output.css,
    indoc! {"
      /* test/file.jsx:2 (Box) */
      ._x0 {
        -webkit-transition:none;
        opacity:0.5;
      }
      ._x0::placeholder {
        color:gray;
      }
      ._x0:hover {
        color:red;
      }
      @media screen and (min-width: 640px) {
        ._x0 {
          margin:0;
        }
      }
    "}
  );
}

#[test]
fn element_media_queries_extend_the_configured_ones() {
  let output = extract(indoc! {r#"
    import { Box } from "jsxstyle";
    <Box mediaQueries={{ lg: "print" }} lgColor="red" />;
    <Box mediaQueries={queries} lgColor="red" />;
  "#});

  assert!(output.css.contains("@media print {\n  ._x0 {\n    color:red;\n  }\n}\n"));
  assert!(squash(&output.js).contains(r#"<div className="_x0"/>;"#));
  assert!(squash(&output.js).contains(r#"<Box mediaQueries={queries} lgColor="red"/>;"#));
  assert_eq!(output.warnings.len(), 1);
  assert_eq!(output.warnings[0].line, 3);
}

#[test]
fn static_namespace_and_whitelisted_modules() {
  let options = ExtractOptions {
    static_namespace: json!({
      "LC": { "staticValue": "ok" },
      "./constants": { "spacing": 8, "default": { "accent": "teal" } }
    })
    .as_object()
    .cloned()
    .unwrap(),
    whitelisted_modules: vec!["./constants".into()],
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      import { Box } from "jsxstyle";
      import theme, { spacing } from "./constants";
      const half = spacing / 2;
      <Box thing={LC.staticValue} padding={half} color={theme.accent} label={`${spacing}-x`} />;
    "#},
    &options,
  );

  assert_eq!(
    output.css,
    indoc! {"
      /* test/file.jsx:4 (Box) */
      ._x0 {
        color:teal;
        label:8-x;
        padding:4px;
        thing:ok;
      }
    "}
  );
}

#[test]
fn local_constants_are_scoped() {
  let output = extract(indoc! {r#"
    import { Box } from "jsxstyle";
    const color = "red";
    function Inner() {
      const color = unknown();
      return <Box color={color} />;
    }
    <Box color={color} />;
  "#});

  assert!(squash(&output.js).contains("return <Box color={color}/>;"));
  assert!(output.css.contains("color:red;"));
  assert_eq!(output.css.matches("._x").count(), 1);
}

#[test]
fn style_groups_get_their_own_classes() {
  let options = ExtractOptions {
    style_groups: vec![IndexMap::from([("display".to_string(), json!("block"))])],
    named_style_groups: IndexMap::from([(
      "_test1".to_string(),
      IndexMap::from([("thing".to_string(), json!("wow"))]),
    )]),
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      import { Block } from "jsxstyle";
      <Block thing="wow" other="ok" />;
    "#},
    &options,
  );

  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className="_x0 _test1 _x1"/>;
    "#,
  );
  assert!(output.css.contains("._x0 {\n  display:block;\n}\n"));
  assert!(output.css.contains("._test1 {\n  thing:wow;\n}\n"));
  assert!(output.css.contains("._x1 {\n  other:ok;\n}\n"));
}

#[test]
fn invalid_style_groups_are_reported() {
  let messages = Arc::new(Mutex::new(Vec::new()));
  let sink = messages.clone();
  let options = ExtractOptions {
    named_style_groups: IndexMap::from([(
      "broken".to_string(),
      IndexMap::from([
        ("thing".to_string(), json!("wow")),
        ("nested".to_string(), json!({ "a": 1 })),
      ]),
    )]),
    error_callback: Some(Arc::new(move |message: &str, file: &str, line: usize| {
      sink
        .lock()
        .unwrap()
        .push(format!("{file}:{line}: {message}"));
    })),
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      import { Block } from "jsxstyle";
      <Block thing="wow" />;
    "#},
    &options,
  );

  assert!(output.css.contains("thing:wow;"));
  let messages = messages.lock().unwrap();
  assert_eq!(messages.len(), 1);
  assert!(messages[0].starts_with("test/file.jsx:2: Style group `broken`"));
}

#[test]
fn component_prop_picks_the_tag() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    import Link from "./Link";
    <Block component="a" href="/home" />;
    <Block component={Link} color="red">text</Block>;
    <Block component={ui.Button} />;
  "#});

  assert!(squash(&output.js).contains(r#"<a className="_x0"/>;"#));
  assert!(squash(&output.js).contains(r#"<Link className="_x1">text</Link>;"#));
  assert!(squash(&output.js).contains(r#"<ui.Button className="_x2"/>;"#));
  assert!(output.css.contains("href:/home;"));
}

#[test]
fn conditional_component_is_hoisted() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    export function App({ flag }) {
      return <Block component={flag ? "a" : "span"} color="red" />;
    }
    export const Inline = ({ flag }) => <Block component={flag ? "a" : "span"} />;
  "#});

  let js = squash(&output.js);
  assert!(
    js.contains(r#"const Component = flag ? "a" : "span"; return <Component className="_x0"/>;"#),
    "{js}"
  );
  assert!(
    js.contains(r#"<Block component={flag ? "a" : "span"}/>"#),
    "{js}"
  );
  assert!(js.contains(r#"import { Block } from "jsxstyle";"#));
}

#[test]
fn conditional_component_in_a_braceless_loop_body_is_not_hoisted() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    export function List({ flag }) {
      const out = [];
      for (let i = 0; i < 2; i++, flag = !flag) out.push(<Block component={flag ? "a" : "span"} />);
      return out;
    }
  "#});

  let js = squash(&output.js);
  assert!(!js.contains("const Component"), "{js}");
  assert!(
    js.contains(r#"out.push(<Block component={flag ? "a" : "span"}/>)"#),
    "{js}"
  );
}

#[test]
fn conditional_component_in_a_braced_loop_body_is_hoisted_inside_the_loop() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    export function List({ flag }) {
      const out = [];
      for (let i = 0; i < 2; i++) {
        out.push(<Block component={flag ? "a" : "span"} color="red" />);
      }
      return out;
    }
  "#});

  let js = squash(&output.js);
  assert!(
    js.contains(
      r#"{ const Component = flag ? "a" : "span"; out.push(<Component className="_x0"/>); }"#
    ),
    "{js}"
  );
  assert!(js.contains("const out = [];"), "{js}");
}

#[test]
fn conditional_component_under_a_guard_is_not_hoisted() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    export function Toolbar({ ui, on }) {
      return ui && <Block component={on ? ui.Button : "span"} />;
    }
    export function Menu({ ui, on }) {
      return on ? <Block component={on ? ui.Button : "span"} /> : null;
    }
  "#});

  let js = squash(&output.js);
  assert!(!js.contains("const Component"), "{js}");
  assert!(
    js.contains(r#"return ui && <Block component={on ? ui.Button : "span"}/>;"#),
    "{js}"
  );
  assert!(
    js.contains(r#"return on ? <Block component={on ? ui.Button : "span"}/> : null;"#),
    "{js}"
  );
}

#[test]
fn props_prop_is_expanded() {
  let output = extract(indoc! {r#"
    import { Block } from "jsxstyle";
    <Block key="k" props={{ id: "main", onClick: handle, ...extra }} color="red" />;
    <Block props={{ className: "nope" }} color="red" />;
  "#});

  let js = squash(&output.js);
  assert!(
    js.contains(r#"<div key="k" id="main" onClick={handle} {...extra} className="_x0"/>;"#),
    "{js}"
  );
  assert!(js.contains(r#"<Block props={{"#), "{js}");
  assert_eq!(output.warnings.len(), 1);
  assert_eq!(output.warnings[0].line, 3);
}

#[test]
fn warnings_go_to_the_callback() {
  let calls = Arc::new(Mutex::new(Vec::new()));
  let sink = calls.clone();
  let options = ExtractOptions {
    error_callback: Some(Arc::new(move |message: &str, file: &str, line: usize| {
      sink
        .lock()
        .unwrap()
        .push((message.to_string(), file.to_string(), line));
    })),
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      import { Block } from "jsxstyle";
      <Block props="nope" />;
      <Block props={5} />;
      <Block component={getTag()} />;
    "#},
    &options,
  );

  let calls = calls.lock().unwrap();
  let lines: Vec<usize> = calls.iter().map(|(_, _, line)| *line).collect();
  assert_eq!(lines, vec![2, 3, 4]);
  assert!(calls.iter().all(|(_, file, _)| file == FILE));
  assert_eq!(output.warnings.len(), 3);
  assert_eq!(output.css, "");
}

#[test]
fn cache_is_shared_across_files() {
  let mut cache = CacheState::new();
  let options = ExtractOptions::default();
  let first = extract_styles(
    "import { Block } from 'jsxstyle';\n<Block staticThing=\"wow\" />;\n",
    "src/a.jsx",
    &mut cache,
    &options,
  )
  .unwrap();
  let second = extract_styles(
    "import { Row, Block } from 'jsxstyle';\n<Row />;\n<Block staticThing=\"wow\" />;\n",
    "src/b.jsx",
    &mut cache,
    &options,
  )
  .unwrap();

  assert!(first.js.contains(r#"className="_x0""#));
  assert!(second.js.contains(r#"className="_x1""#));
  assert!(second.js.contains(r#"className="_x0""#));
  assert!(second.css.contains("/* src/b.jsx:3 (Block) */\n._x0 {"));
  assert_eq!(second.css_file_name.as_deref(), Some("src/b.jsxstyle.css"));
  assert_eq!(cache.counter, 2);
  assert_eq!(
    cache.get("display:block;staticThing:wow;"),
    Some("_x0")
  );
}

#[test]
fn output_is_deterministic() {
  let source = indoc! {r#"
    import { Block, Row } from "jsxstyle";
    <Row color={a ? "red" : "blue"}>
      <Block margin={4} hoverColor="green" />
      <Block margin={4} hoverColor="green" />
    </Row>;
  "#};
  let first = extract(source);
  let second = extract(source);
  assert_eq!(first, second);
  assert_eq!(first.css.matches("/* test/file.jsx").count(), 5);
}

#[test]
fn second_run_leaves_the_output_alone() {
  let first = extract(indoc! {r#"
    import { Block, useMatchMedia } from "jsxstyle";
    <Block color="red" />;
  "#});
  assert!(first.js.contains("useMatchMedia"));

  let second = extract(&first.js);
  assert_eq!(second.js, first.js);
  assert_eq!(second.css, "");
}

#[test]
fn commonjs_modules_use_require() {
  let output = extract(indoc! {r#"
    "use strict";
    const { Block } = require("jsxstyle");
    module.exports = <Block color="red" />;
  "#});

  assert_js(
    &output,
    r#"
      "use strict";
      require("test/file.jsxstyle.css");
      module.exports = <div className="_x0"/>;
    "#,
  );
}

#[test]
fn lite_mode_maps_tags_to_components() {
  let options = ExtractOptions {
    lite_mode: LiteMode::React,
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      <block color="red" />;
      <inline-block color={color}>text</inline-block>;
      <div />;
    "#},
    &options,
  );

  assert_js(
    &output,
    r#"
      require("test/file.jsxstyle.css");
      const { InlineBlock: InlineBlock } = require("jsxstyle");
      <div className="_x0"/>;
      <InlineBlock color={color}>text</InlineBlock>;
      <div/>;
    "#,
  );
}

#[test]
fn preact_lite_mode_uses_class() {
  let options = ExtractOptions {
    lite_mode: LiteMode::Preact,
    ..Default::default()
  };
  let output = extract_with(
    indoc! {r#"
      export const a = <row color="red" />;
      export const b = <row color={color} />;
    "#},
    &options,
  );

  let js = squash(&output.js);
  assert!(js.contains(r#"import { Row } from "jsxstyle/preact";"#), "{js}");
  assert!(js.contains(r#"<div class="_x0"/>"#), "{js}");
  assert!(js.contains(r#"<Row color={color}/>"#), "{js}");
}

#[test]
fn hash_naming_and_custom_components() {
  let mut options: ExtractOptions = serde_json::from_value(json!({
    "classNaming": "hash",
    "components": { "Card": { "tag": "section", "styles": { "padding": 16 } } }
  }))
  .unwrap();
  options.module_sources.push("./ui".into());

  let output = extract_with(
    indoc! {r#"
      import { Card } from "./ui";
      <Card color="red" />;
    "#},
    &options,
  );

  let js = squash(&output.js);
  assert!(js.contains("<section className=\"_"), "{js}");
  assert!(!js.contains("_x0"));
  assert!(output.css.contains("  padding:16px;\n"));
}

#[test]
fn typescript_wrappers_are_folded() {
  let mut cache = CacheState::new();
  let output = extract_styles(
    "import { Box } from 'jsxstyle';\nconst size = 10 as const;\nexport const a = <Box width={size!} height={(size satisfies number) * 2} />;\n",
    "test/file.tsx",
    &mut cache,
    &ExtractOptions::default(),
  )
  .unwrap();

  assert!(output.css.contains("height:20px;\n  width:10px;\n"));
}

#[test]
fn logical_or_is_gated() {
  let source = indoc! {r#"
    import { Box } from "jsxstyle";
    <Box color={custom || "red"} />;
  "#};
  assert_eq!(extract(source).css, "");

  let options = ExtractOptions {
    extract_logical_or: true,
    ..Default::default()
  };
  let output = extract_with(source, &options);
  assert_js(
    &output,
    r#"
      import "test/file.jsxstyle.css";
      <div className={custom ? "" : "_x0"}/>;
    "#,
  );
}

#[test]
fn class_naming_option_deserializes() {
  let options: ExtractOptions = serde_json::from_value(json!({ "classNaming": "counter" })).unwrap();
  assert_eq!(options.class_naming, ClassNamingMode::Counter);
}

#[test]
fn parse_errors_are_fatal() {
  let mut cache = CacheState::new();
  let error = extract_styles(
    "import { Block } from 'jsxstyle';\n\n<Block color=\"red\" \n",
    FILE,
    &mut cache,
    &ExtractOptions::default(),
  )
  .unwrap_err();

  match error {
    ExtractError::Parse { file, .. } => assert_eq!(file, FILE),
    other => panic!("unexpected error {other:?}"),
  }
  assert_eq!(cache.counter, 0);
}
