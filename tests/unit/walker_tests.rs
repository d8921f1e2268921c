/*!
 * Document graph walker tests: cycle and diamond safety through the
 * public API.
 */

use latrans::project::{self, DiscoveryWarning};

use crate::common::write_project;

#[test]
fn test_discover_withMutualInclusion_shouldYieldBothUnitsOnce() {
    let (_guard, root) = write_project(&[
        ("a.tex", "\\documentclass{article}\n\\input{b}\nprose a"),
        ("b.tex", "\\input{a}\nprose b"),
    ]);

    let entry = project::find_entry_file(&root).unwrap();
    let graph = project::discover(&root, &entry).unwrap();

    let names: Vec<String> = graph.units.iter().map(|u| u.name()).collect();
    assert_eq!(names, vec!["a.tex", "b.tex"]);
    assert!(graph
        .warnings
        .iter()
        .any(|w| matches!(w, DiscoveryWarning::CycleTruncated { .. })));
}

#[test]
fn test_discover_withDiamond_shouldNotReportCycle() {
    let (_guard, root) = write_project(&[
        (
            "main.tex",
            "\\documentclass{article}\n\\input{left}\n\\input{right}\n",
        ),
        ("left.tex", "\\input{shared}"),
        ("right.tex", "\\input{shared}"),
        ("shared.tex", "leaf prose"),
    ]);

    let entry = project::find_entry_file(&root).unwrap();
    let graph = project::discover(&root, &entry).unwrap();

    assert_eq!(graph.units.len(), 4);
    assert!(
        !graph
            .warnings
            .iter()
            .any(|w| matches!(w, DiscoveryWarning::CycleTruncated { .. })),
        "diamond inclusion is not a cycle"
    );
}

#[test]
fn test_discover_withNestedDirectories_shouldResolveRelativeToFile() {
    let (_guard, root) = write_project(&[
        (
            "main.tex",
            "\\documentclass{article}\n\\input{chapters/one}\n",
        ),
        ("chapters/one.tex", "\\input{two}\nchapter one"),
        ("chapters/two.tex", "chapter two"),
    ]);

    let entry = project::find_entry_file(&root).unwrap();
    let graph = project::discover(&root, &entry).unwrap();

    let names: Vec<String> = graph.units.iter().map(|u| u.name()).collect();
    assert_eq!(
        names,
        vec!["main.tex", "chapters/one.tex", "chapters/two.tex"]
    );
}

#[test]
fn test_discover_entryUnit_shouldAlwaysBeInUnitSet() {
    let (_guard, root) = write_project(&[(
        "main.tex",
        "\\documentclass{article}\nno includes here",
    )]);

    let entry = project::find_entry_file(&root).unwrap();
    let graph = project::discover(&root, &entry).unwrap();

    assert_eq!(graph.units.len(), 1);
    assert!(graph.units[0].is_entry);
}
