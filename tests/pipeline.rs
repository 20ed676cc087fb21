//! End-to-end scenarios: whole tables in, whole pseudocode programs out.

mod common;

use dtc::{compile, Error, Options, Source};
use std::collections::HashMap;

fn sources(text: &str) -> Vec<Source> {
    vec![Source {
        path: "table.csv".to_string(),
        data: text.as_bytes().to_vec(),
    }]
}

fn compile_ok(text: &str, quick: bool) -> String {
    let mut buf = Vec::new();
    compile(&sources(text), Options { quick }, &mut buf).expect("compile should succeed");
    String::from_utf8(buf).unwrap()
}

fn compile_err(text: &str) -> Vec<Error> {
    let mut buf = Vec::new();
    compile(&sources(text), Options::default(), &mut buf).unwrap_err()
}

const TRAFFIC_LIGHT: &str = "@proceed,signal\n\
                             yes,green\n\
                             no,red\n\
                             @proceed,signal,canStop\n\
                             yes,yellow,no\n\
                             no,yellow,yes\n";

// The four-table README example: proceed from the light, accelerator and
// brake from proceed.
const DRIVE: &str = "@proceed,signal\n\
                     yes,green\n\
                     no,red\n\
                     @proceed,signal,canStop\n\
                     yes,yellow,no\n\
                     no,yellow,yes\n\
                     @accelerator,proceed\n\
                     on,yes\n\
                     off,no\n\
                     @brake,proceed\n\
                     no,yes\n\
                     yes,no\n";

#[test]
fn s1_traffic_light() {
    let psu = compile_ok(TRAFFIC_LIGHT, false);
    assert_eq!(
        psu,
        "I,canStop,no\n\
         I,canStop,yes\n\
         I,signal,green\n\
         I,signal,red\n\
         I,signal,yellow\n\
         O,proceed,no\n\
         O,proceed,yes\n\
         D,2\n\
         T,signal,yellow,1\n\
         L,2\n\
         T,signal,green,3\n\
         L,4\n\
         R,proceed,no\n\
         J,0\n\
         L,3\n\
         R,proceed,yes\n\
         J,0\n\
         L,1\n\
         T,canStop,no,3\n\
         J,4\n\
         L,0\n"
    );
}

#[test]
fn s1_traffic_light_fidelity() {
    let program = common::parse(&compile_ok(TRAFFIC_LIGHT, false));
    let expect = |signal: &str, can_stop: &str| -> &'static str {
        match (signal, can_stop) {
            ("green", _) => "yes",
            ("red", _) => "no",
            ("yellow", "no") => "yes",
            ("yellow", "yes") => "no",
            _ => unreachable!(),
        }
    };
    let envs = program.all_assignments();
    assert_eq!(envs.len(), 6);
    for env in envs {
        let out = program.run(&env);
        assert_eq!(
            out["proceed"],
            expect(&env["signal"], &env["canStop"]),
            "wrong proceed for {env:?}"
        );
    }
}

#[test]
fn s2_drive_tables() {
    let psu = compile_ok(DRIVE, false);
    assert_eq!(
        psu,
        "I,canStop,no\n\
         I,canStop,yes\n\
         I,signal,green\n\
         I,signal,red\n\
         I,signal,yellow\n\
         O,accelerator,off\n\
         O,accelerator,on\n\
         O,brake,no\n\
         O,brake,yes\n\
         O,proceed,no\n\
         O,proceed,yes\n\
         D,2\n\
         T,signal,yellow,1\n\
         L,2\n\
         T,signal,green,3\n\
         L,4\n\
         R,accelerator,off\n\
         R,brake,yes\n\
         R,proceed,no\n\
         J,0\n\
         L,3\n\
         R,accelerator,on\n\
         R,brake,no\n\
         R,proceed,yes\n\
         J,0\n\
         L,1\n\
         T,canStop,no,3\n\
         J,4\n\
         L,0\n"
    );

    // Each brake resolution is emitted once, under a label other branches
    // jump to.
    assert_eq!(psu.matches("R,brake,yes").count(), 1);
    assert_eq!(psu.matches("R,brake,no").count(), 1);
    assert!(psu.contains("J,3") || psu.contains("T,canStop,no,3"));
    assert!(psu.contains("J,4"));
}

#[test]
fn s2_drive_fidelity() {
    let program = common::parse(&compile_ok(DRIVE, false));
    for env in program.all_assignments() {
        let out = program.run(&env);
        let proceed = match (env["signal"].as_str(), env["canStop"].as_str()) {
            ("green", _) => "yes",
            ("red", _) => "no",
            ("yellow", "no") => "yes",
            _ => "no",
        };
        assert_eq!(out["proceed"], proceed);
        assert_eq!(out["accelerator"], if proceed == "yes" { "on" } else { "off" });
        assert_eq!(out["brake"], if proceed == "yes" { "no" } else { "yes" });
    }
}

#[test]
fn s3_contradiction() {
    let errors = compile_err("@proceed,signal\nyes,green\nno,green\n");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Error::Contradiction {
            name,
            row_a,
            row_b,
            ..
        } => {
            assert_eq!(name, "proceed");
            let mut rows = [*row_a, *row_b];
            rows.sort_unstable();
            assert_eq!(rows, [2, 3]);
        }
        other => panic!("expected contradiction, got {other}"),
    }
}

#[test]
fn s4_under_specified_name() {
    let errors = compile_err("@x,y\na,b\n");
    assert!(errors
        .iter()
        .any(|e| matches!(e, Error::UnderSpecifiedName { name } if name == "x")));
}

#[test]
fn s5_quick_vs_full() {
    // Ten names, twenty values: out plus nine two-valued inputs. out is
    // yes as soon as any input is a, no only when all are b.
    let mut text = String::from("@out,x1,x2,x3,x4,x5,x6,x7,x8,x9\n");
    for i in 1..=9 {
        text.push_str("yes");
        for j in 1..=9 {
            text.push(',');
            if i == j {
                text.push('a');
            }
        }
        text.push('\n');
    }
    text.push_str("no,b,b,b,b,b,b,b,b,b\n");

    let quick = common::parse(&compile_ok(&text, true));
    let full = common::parse(&compile_ok(&text, false));

    let names: u32 = 10;
    assert!(quick.depth <= names);
    assert!(full.depth <= quick.depth);

    for env in full.all_assignments() {
        let expected = if env.values().any(|v| v == "a") { "yes" } else { "no" };
        assert_eq!(full.run(&env)["out"], expected);
        assert_eq!(quick.run(&env)["out"], expected);
    }
}

#[test]
fn s6_quoting_round_trip() {
    let text = "@\"out,put\",\"in\"\"put\"\n\
                \"yes,really\",\"val\"\"1\"\n\
                no,\"val,2\"\n";
    let psu = compile_ok(text, false);
    let program = common::parse(&psu);
    assert_eq!(program.inputs[0].0, "in\"put");
    assert_eq!(program.inputs[0].1, vec!["val\"1", "val,2"]);
    assert_eq!(program.outputs[0].0, "out,put");

    let mut env = HashMap::new();
    env.insert("in\"put".to_string(), "val,2".to_string());
    assert_eq!(program.run(&env)["out,put"], "no");
}

#[test]
fn deterministic_output() {
    let first = compile_ok(DRIVE, false);
    let second = compile_ok(DRIVE, false);
    assert_eq!(first, second);
}

#[test]
fn depth_record_is_search_depth_plus_one() {
    let mut buf = Vec::new();
    let stats = compile(&sources(TRAFFIC_LIGHT), Options::default(), &mut buf).unwrap();
    let program = common::parse(&String::from_utf8(buf).unwrap());
    assert_eq!(program.depth, stats.depth + 1);
}

#[test]
fn compiles_tables_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let light = dir.path().join("light.csv");
    let brake = dir.path().join("brake.csv");
    std::fs::write(&light, "@proceed,signal\nyes,green\nno,red\n").unwrap();
    std::fs::write(&brake, "@brake,proceed\nno,yes\nyes,no\n").unwrap();

    let sources: Vec<Source> = [&light, &brake]
        .iter()
        .map(|p| Source {
            path: p.display().to_string(),
            data: std::fs::read(p).unwrap(),
        })
        .collect();
    let mut buf = Vec::new();
    let stats = compile(&sources, Options::default(), &mut buf).unwrap();
    assert_eq!(stats.inferences, 4);
    assert!(String::from_utf8(buf).unwrap().ends_with("L,0\n"));
}

#[test]
fn multi_file_inputs_share_one_graph() {
    let sources = vec![
        Source {
            path: "lights.csv".to_string(),
            data: b"@proceed,signal\nyes,green\nno,red\n".to_vec(),
        },
        Source {
            path: "brake.csv".to_string(),
            data: b"@brake,proceed\nno,yes\nyes,no\n".to_vec(),
        },
    ];
    let mut buf = Vec::new();
    compile(&sources, Options::default(), &mut buf).unwrap();
    let program = common::parse(&String::from_utf8(buf).unwrap());
    for env in program.all_assignments() {
        let out = program.run(&env);
        let proceed = if env["signal"] == "green" { "yes" } else { "no" };
        assert_eq!(out["proceed"], proceed);
        assert_eq!(out["brake"], if proceed == "yes" { "no" } else { "yes" });
    }
}
