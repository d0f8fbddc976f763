//! Call-site and construction edges.

use tree_sitter::Node;

use super::{CallGraphExtractor, EdgeSet, EdgeTarget};
use crate::adapter::{is_qualified, last_segment, strip_generics, Callee};
use crate::graph::types::DependencyKind;
use crate::walker::{ancestors, walk};

impl CallGraphExtractor<'_> {
    /// Walk `body` for invocations and constructions.
    pub(super) fn collect_calls(&self, body: Node<'_>, edges: &mut EdgeSet<'_>) {
        walk(body, |node| {
            if self.adapter.is_call(node) {
                if let Some(callee) = self.adapter.callee(node, &self.src) {
                    self.add_call(node, callee, edges);
                }
            } else if self.adapter.is_construction(node) {
                self.add_construction(node, edges);
            }
            true
        });
    }

    fn add_call(&self, node: Node<'_>, callee: Callee, edges: &mut EdgeSet<'_>) {
        if callee.name.is_empty() {
            return;
        }
        let builtin = match &callee.qualifier {
            Some(qualifier) => self.builtins.is_builtin_qualifier(qualifier),
            None => self.builtins.is_builtin(&callee.name),
        };
        if builtin {
            return;
        }

        let full = callee.full();
        edges.add(
            full.clone(),
            EdgeTarget {
                kind: DependencyKind::Calls,
                to_id: self.resolve(&full),
                to_qualified: callee.qualifier.is_some().then(|| full.clone()),
                to_name: callee.name,
                line: node.start_position().row + 1,
                optional: self.is_conditional(node),
            },
        );
    }

    /// Constructions are calls to the constructed type.
    fn add_construction(&self, node: Node<'_>, edges: &mut EdgeSet<'_>) {
        let Some(raw) = self.adapter.constructed_type(node, &self.src) else {
            return;
        };
        let ty = strip_generics(&raw);
        if ty.is_empty() || self.builtins.is_builtin_qualifier(&ty) {
            return;
        }

        edges.add(
            ty.clone(),
            EdgeTarget {
                kind: DependencyKind::Calls,
                to_id: self.resolve(&ty),
                to_name: last_segment(&ty).to_string(),
                to_qualified: is_qualified(&ty).then(|| ty.clone()),
                line: node.start_position().row + 1,
                optional: self.is_conditional(node),
            },
        );
    }

    /// A branch between `node` and its nearest callable boundary.
    pub(super) fn is_conditional(&self, node: Node<'_>) -> bool {
        for ancestor in ancestors(node) {
            let kind = ancestor.kind();
            if self.adapter.is_branch(kind) {
                return true;
            }
            if self.adapter.is_callable_boundary(kind) {
                return false;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::callgraph::tests::{edges_of, of_kind};
    use crate::graph::types::DependencyKind;

    #[test]
    fn test_repeated_call_is_one_edge() {
        let deps = edges_of(
            "a.rs",
            "fn save() {}\nfn run() { save(); save(); }\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_name, "save");
        assert!(calls[0].is_resolved());
        assert_eq!(calls[0].location.line, 2);
    }

    #[test]
    fn test_conditional_call_in_if() {
        let deps = edges_of(
            "a.go",
            "package m\n\nfunc run(ok bool) {\n\tif ok {\n\t\tnotify()\n\t}\n\tstore()\n}\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        let notify = calls.iter().find(|d| d.to_name == "notify").unwrap();
        let store = calls.iter().find(|d| d.to_name == "store").unwrap();
        assert!(notify.optional);
        assert!(!store.optional);
        assert!(!notify.is_resolved());
    }

    #[test]
    fn test_if_condition_counts_as_inside_the_branch() {
        let deps = edges_of(
            "S.java",
            "class S {\n  void run() {\n    if (ok()) {\n      save();\n    }\n    close();\n  }\n}\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        let optional = |name: &str| calls.iter().find(|d| d.to_name == name).unwrap().optional;
        assert!(optional("ok"));
        assert!(optional("save"));
        assert!(!optional("close"));
    }

    #[test]
    fn test_ternary_is_a_branch() {
        let java = edges_of(
            "S.java",
            "class S {\n  int pick() {\n    return ready() ? fast() : slow();\n  }\n}\n",
            "pick",
        );
        let ts = edges_of(
            "a.ts",
            "function pick(): number {\n  const n = base();\n  return ready() ? fast() : slow();\n}\n",
            "pick",
        );
        for deps in [&java, &ts] {
            for name in ["ready", "fast", "slow"] {
                let call = deps.iter().find(|d| d.to_name == name).unwrap();
                assert!(call.optional, "{} should be conditional", name);
            }
        }
        assert!(!ts.iter().find(|d| d.to_name == "base").unwrap().optional);
    }

    #[test]
    fn test_unconditional_occurrence_wins() {
        let deps = edges_of(
            "a.ts",
            "function run(mode: number) {\n  audit();\n  switch (mode) {\n    case 1:\n      audit();\n      break;\n  }\n}\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].optional);
    }

    #[test]
    fn test_only_conditional_occurrences_stay_optional() {
        let deps = edges_of(
            "a.py",
            "def run(x):\n    if x:\n        audit()\n    else:\n        audit()\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].optional);
    }

    #[test]
    fn test_closure_is_a_boundary() {
        let deps = edges_of(
            "a.rs",
            "fn run(x: bool) {\n    if x {\n        let f = || flush();\n        f();\n    }\n}\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        let flush = calls.iter().find(|d| d.to_name == "flush").unwrap();
        let f = calls.iter().find(|d| d.to_name == "f").unwrap();
        assert!(!flush.optional);
        assert!(f.optional);
    }

    #[test]
    fn test_qualified_call_keeps_qualifier() {
        let deps = edges_of(
            "S.java",
            "class S {\n  void save() {}\n  void run() { this.repo.save(); }\n}\n",
            "run",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls[0].to_name, "save");
        assert_eq!(calls[0].to_qualified.as_deref(), Some("this.repo.save"));
        // falls back to the last segment
        assert!(calls[0].is_resolved());
    }

    #[test]
    fn test_self_path_call_targets_impl_type() {
        let deps = edges_of(
            "u.rs",
            "struct User;\nimpl User {\n    fn validate() {}\n    fn create() -> Self { Self::validate(); Self {} }\n}\n",
            "create",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to_name, "validate");
        assert_eq!(calls[0].to_qualified.as_deref(), Some("User::validate"));
        assert!(calls[0].is_resolved());
        assert_eq!(calls[1].to_name, "User");
        assert!(calls[1].is_resolved());
        assert!(!deps.iter().any(|d| d.to_name == "Self"));
    }

    #[test]
    fn test_construction_is_a_call() {
        let deps = edges_of(
            "a.rs",
            "struct Config { port: u16 }\nfn load() -> Config { Config { port: 80 } }\n",
            "load",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_name, "Config");
        assert!(calls[0].is_resolved());
    }

    #[test]
    fn test_builtin_construction_and_calls_are_filtered() {
        let java = edges_of(
            "A.java",
            "class A { void f() { List<String> xs = new ArrayList<>(); xs.add(\"a\"); } }\n",
            "f",
        );
        assert!(!java.iter().any(|d| d.to_name == "ArrayList"));
        assert!(!java.iter().any(|d| d.to_name == "List"));

        let rust = edges_of(
            "a.rs",
            "fn f() -> String { let s = String::from(\"x\"); println!(\"{}\", s); s }\n",
            "f",
        );
        assert!(!rust.iter().any(|d| d.to_name == "from"));
        assert!(!rust.iter().any(|d| d.to_name == "String"));
        assert!(!rust.iter().any(|d| d.to_name == "println"));
    }

    #[test]
    fn test_go_stdlib_selector_is_filtered() {
        let deps = edges_of(
            "m.go",
            "package m\n\nfunc f() { fmt.Println(\"x\"); users.Find(1) }\n",
            "f",
        );
        let calls = of_kind(&deps, DependencyKind::Calls);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_qualified.as_deref(), Some("users.Find"));
    }
}
