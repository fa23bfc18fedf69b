#![allow(clippy::disallowed_methods)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use pretty_assertions::assert_eq;
use reqpack::{
    BundleError, BundleOrchestrator, BundleOutput, config::Config, module_graph::ModuleId,
    runtime::PRELUDE, scanner::find_require_calls,
};
use tempfile::TempDir;

struct Project {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        for (name, content) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn bundle(&self, entry: &str) -> BundleOutput {
        BundleOrchestrator::new(Config::default())
            .bundle(&self.root.join(entry))
            .unwrap()
    }

    /// Unit body of module `id` inside the bundle text
    fn unit<'a>(&self, output: &'a BundleOutput, id: u32) -> &'a str {
        let text = output.bundle.text();
        let header = format!("define({id}, function(module, exports, require) {{\n");
        let start = text.find(&header).unwrap() + header.len();
        let end = start + text[start..].find("\n});\n").unwrap();
        &text[start..end]
    }
}

/// Whether `node` can run bundles. Set `REQPACK_REQUIRE_NODE` to turn a missing node into
/// a failure instead of a skip.
#[allow(clippy::print_stderr)]
fn node_available() -> bool {
    let available = Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !available {
        assert!(
            std::env::var_os("REQPACK_REQUIRE_NODE").is_none(),
            "REQPACK_REQUIRE_NODE is set but node is not on PATH"
        );
        eprintln!("node not found, skipping bundle execution checks");
    }
    available
}

/// Run a script with node, returning stdout. The script is copied outside any project.
fn run_node(script: &Path) -> String {
    let output = Command::new("node").arg(script).output().unwrap();
    assert!(
        output.status.success(),
        "node failed on {}:\n{}",
        script.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn run_bundle(output: &BundleOutput) -> String {
    let out_dir = TempDir::new().unwrap();
    let path = out_dir.path().join("bundle.js");
    output.write_to(&path).unwrap();
    run_node(&path)
}

const FRUIT: &[(&str, &str)] = &[
    ("index.js", "const apple = require('./apple');\nconsole.log(apple);\n"),
    (
        "apple.js",
        "module.exports = 'apple ' + require('./banana') + ' ' + require('./kiwi');\n",
    ),
    ("banana.js", "module.exports = 'banana ' + require('./kiwi');\n"),
    (
        "kiwi.js",
        "module.exports = 'kiwi ' + require('./melon') + ' ' + require('./tomato');\n",
    ),
    ("melon.js", "module.exports = 'melon';\n"),
    ("tomato.js", "module.exports = 'tomato';\n"),
];

#[test]
fn test_acyclic_ids_and_rewrites() {
    let project = Project::new(FRUIT);
    let output = project.bundle("index.js");

    let names: Vec<_> = output
        .modules
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["index.js", "apple.js", "banana.js", "kiwi.js", "melon.js", "tomato.js"]
    );
    assert!(output.cycles.is_empty());
    assert_eq!(
        project.unit(&output, 1),
        "module.exports = 'apple ' + require(2) + ' ' + require(3);"
    );
    assert!(output.bundle.text().ends_with("requireModule(0);\n"));
}

#[test]
fn test_acyclic_bundle_matches_native_loader() {
    if !node_available() {
        return;
    }
    let project = Project::new(FRUIT);
    let output = project.bundle("index.js");

    let native = run_node(&project.root.join("index.js"));
    assert_eq!(native, "apple banana kiwi melon tomato kiwi melon tomato\n");
    assert_eq!(run_bundle(&output), native);
}

#[test]
fn test_cycle_builds_and_terminates() {
    let project = Project::new(&[
        ("index.js", "const a = require('./a');\nconsole.log(a.name, a.sawB);\n"),
        (
            "a.js",
            "exports.name = 'a';\nconst b = require('./b');\nexports.sawB = b.sawA;\n",
        ),
        (
            "b.js",
            "const a = require('./a');\nexports.sawA = a.name + ':' + String(a.sawB);\n",
        ),
    ]);
    let output = project.bundle("index.js");

    let ids: Vec<_> = output
        .modules
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(ids, vec!["index.js", "a.js", "b.js"]);
    assert_eq!(output.cycles, vec![vec![ModuleId::new(1), ModuleId::new(2)]]);
    assert_eq!(output.bundle.units().len(), 3);

    if node_available() {
        // b observes a's partial exports: name set, sawB not yet
        assert_eq!(run_bundle(&output), "a a:undefined\n");
    }
}

#[test]
fn test_module_side_effect_runs_once() {
    let project = Project::new(&[
        (
            "index.js",
            "const c1 = require('./counter');\nconst c2 = require('./counter.js');\nconsole.log(c1 === c2, globalThis.count);\n",
        ),
        (
            "counter.js",
            "globalThis.count = (globalThis.count || 0) + 1;\nmodule.exports = {};\n",
        ),
    ]);
    let output = project.bundle("index.js");
    assert_eq!(output.module_count(), 2);
    assert_eq!(
        project.unit(&output, 0),
        "const c1 = require(1);\nconst c2 = require(1);\nconsole.log(c1 === c2, globalThis.count);"
    );

    if node_available() {
        assert_eq!(run_bundle(&output), "true 1\n");
    }
}

#[test]
fn test_diamond_uses_single_id() {
    let project = Project::new(&[
        ("a.js", "console.log(require('./lib/b') + require('./lib/c'));\n"),
        ("lib/b.js", "module.exports = require('./d');\n"),
        ("lib/c.js", "module.exports = require('../lib/d.js');\n"),
        ("lib/d.js", "module.exports = 21;\n"),
    ]);
    let output = project.bundle("a.js");
    assert_eq!(output.module_count(), 4);

    let ids_in = |id: u32| -> Vec<u32> {
        find_require_calls(project.unit(&output, id))
            .iter()
            .filter_map(|call| call.id())
            .collect()
    };
    assert_eq!(ids_in(1), vec![3]);
    assert_eq!(ids_in(2), vec![3]);

    if node_available() {
        assert_eq!(run_bundle(&output), "42\n");
    }
}

#[test]
fn test_lookalike_text_is_preserved() {
    let project = Project::new(&[
        (
            "index.js",
            "const label = './dep';\n// require('./dep') in a comment\nconst dep = require('./dep');\nconsole.log(label, dep);\n",
        ),
        ("dep.js", "module.exports = 'dep';\n"),
    ]);
    let output = project.bundle("index.js");
    assert_eq!(
        project.unit(&output, 0),
        "const label = './dep';\n// require('./dep') in a comment\nconst dep = require(1);\nconsole.log(label, dep);"
    );

    if node_available() {
        assert_eq!(run_bundle(&output), "./dep dep\n");
    }
}

#[test]
fn test_esm_sources_are_normalized() {
    let project = Project::new(&[
        (
            "index.js",
            "import greet, { shout } from './greet';\nimport * as math from './math';\nconsole.log(greet('bundle'), shout('hi'), math.double(21));\n",
        ),
        (
            "greet.js",
            "export default function greet(name) { return 'hello ' + name; }\nexport const shout = (s) => s.toUpperCase();\n",
        ),
        ("math.js", "export function double(n) { return n * 2; }\n"),
    ]);
    let output = project.bundle("index.js");
    assert_eq!(output.module_count(), 3);

    if node_available() {
        assert_eq!(run_bundle(&output), "hello bundle HI 42\n");
    }
}

#[test]
fn test_node_modules_dependency() {
    let project = Project::new(&[
        ("src/index.js", "console.log(require('pad')('x'));\n"),
        ("src/node_modules/pad/package.json", r#"{ "main": "pad.js" }"#),
        (
            "src/node_modules/pad/pad.js",
            "module.exports = (s) => '[' + s + ']';\n",
        ),
    ]);
    let output = project.bundle("src/index.js");
    assert_eq!(output.module_count(), 2);
    assert_eq!(output.indexed_files, 1);

    if node_available() {
        assert_eq!(run_bundle(&output), "[x]\n");
    }
}

#[test]
fn test_missing_entry_is_entry_not_found() {
    let project = Project::new(&[("index.js", "")]);
    let err = BundleOrchestrator::new(Config::default())
        .bundle(&project.root.join("missing.js"))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::EntryNotFound { .. })
    ));
}

#[test]
fn test_unresolvable_dependency_produces_no_output() {
    let project = Project::new(&[("index.js", "require('./nowhere');\n")]);
    let err = BundleOrchestrator::new(Config::default())
        .bundle(&project.root.join("index.js"))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::UnresolvableDependency { .. })
    ));
}

#[test]
fn test_repeat_builds_are_byte_identical() {
    let project = Project::new(FRUIT);
    let first = project.bundle("index.js");
    let second = project.bundle("index.js");
    assert_eq!(first.bundle.text(), second.bundle.text());
    assert_eq!(first.fingerprint, second.fingerprint);

    fs::write(project.root.join("melon.js"), "module.exports = 'watermelon';\n").unwrap();
    let changed = project.bundle("index.js");
    assert_ne!(changed.fingerprint, first.fingerprint);
}

#[test]
fn test_prelude_loader_errors_and_retry() {
    if !node_available() {
        return;
    }
    let script = format!(
        "{PRELUDE}\n{}",
        r#"define(0, function (module) { module.exports = 'zero'; });
try { define(0, function () {}); } catch (e) { console.log(e.message); }
try { requireModule(9); } catch (e) { console.log(e.message); }
let attempts = 0;
define(1, function (module) {
  attempts += 1;
  if (attempts === 1) throw new Error('boom');
  module.exports = 'ok';
});
try { requireModule(1); } catch (e) { console.log(e.message); }
console.log(requireModule(1), attempts);
console.log(requireModule(1), attempts);
"#
    );
    let out_dir = TempDir::new().unwrap();
    let path = out_dir.path().join("loader.js");
    fs::write(&path, script).unwrap();

    assert_eq!(
        run_node(&path),
        "Module 0 is already defined\nModule 9 does not exist\nboom\nok 2\nok 2\n"
    );
}

#[test]
fn test_hashbang_entry_runs() {
    let project = Project::new(&[
        ("cli.js", "#!/usr/bin/env node\nconsole.log(require(\"./a\"));\n"),
        ("a.js", "module.exports = 'a';\n"),
    ]);
    let output = project.bundle("cli.js");
    assert!(project.unit(&output, 0).starts_with("///usr/bin/env node\n"));

    if node_available() {
        assert_eq!(run_bundle(&output), "a\n");
    }
}

#[test]
fn test_imports_run_before_the_importing_body() {
    let project = Project::new(&[
        ("index.js", "console.log(\"main start\");\nimport \"./dep\";\n"),
        ("dep.js", "console.log(\"dep\");\n"),
    ]);
    let output = project.bundle("index.js");

    if node_available() {
        assert_eq!(run_bundle(&output), "dep\nmain start\n");
    }
}

#[test]
fn test_exports_are_live_during_cycles() {
    let project = Project::new(&[
        (
            "index.js",
            "import { a, b } from './values';\nimport { Point } from './point';\nconsole.log(a, b, new Point(3).x);\n",
        ),
        ("values.js", "export const a = 1, b = 2;\n"),
        (
            "point.js",
            "import { seen } from './observer';\nexport class Point {\n  constructor(x) {\n    this.x = x;\n  }\n}\nseen();\n",
        ),
        (
            "observer.js",
            "const point = require('./point');\nexports.seen = () => console.log(typeof point.Point);\n",
        ),
    ]);
    let output = project.bundle("index.js");
    assert_eq!(output.module_count(), 4);

    if node_available() {
        assert_eq!(run_bundle(&output), "function\n1 2 3\n");
    }
}

#[test]
fn test_module_syntax_inside_templates_is_kept() {
    let project = Project::new(&[(
        "index.js",
        "const text = `\nimport x from \"./nothing\"\n`;\nconsole.log(text.trim());\n",
    )]);
    let output = project.bundle("index.js");
    assert_eq!(output.module_count(), 1);

    if node_available() {
        assert_eq!(run_bundle(&output), "import x from \"./nothing\"\n");
    }
}
