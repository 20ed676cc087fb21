//! A reference interpreter for emitted pseudocode, used by the end-to-end
//! and property tests: parse the CSV records, then run the label/test/jump
//! state machine against a concrete input assignment.

use std::collections::HashMap;

#[derive(Debug)]
enum Op {
    Label(u32),
    Jump(u32),
    Test {
        name: String,
        value: String,
        target: u32,
    },
    Resolve {
        name: String,
        value: String,
    },
}

#[derive(Debug, Default)]
pub struct Program {
    /// Input variables with their values, in emission order.
    pub inputs: Vec<(String, Vec<String>)>,
    /// Output variables with their values, in emission order.
    pub outputs: Vec<(String, Vec<String>)>,
    pub depth: u32,
    ops: Vec<Op>,
    labels: HashMap<u32, usize>,
}

fn push_universe(universe: &mut Vec<(String, Vec<String>)>, name: &str, value: &str) {
    if let Some((_, values)) = universe.iter_mut().find(|(n, _)| n == name) {
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    } else {
        universe.push((name.to_string(), vec![value.to_string()]));
    }
}

pub fn parse(psu: &str) -> Program {
    let mut program = Program::default();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(psu.as_bytes());
    for record in rdr.records() {
        let record = record.expect("pseudocode must be well-formed CSV");
        let field = |i: usize| record.get(i).unwrap().to_string();
        match record.get(0).unwrap() {
            "I" => push_universe(&mut program.inputs, &field(1), &field(2)),
            "O" => push_universe(&mut program.outputs, &field(1), &field(2)),
            "D" => program.depth = field(1).parse().unwrap(),
            "L" => {
                let label = field(1).parse().unwrap();
                program.labels.insert(label, program.ops.len());
                program.ops.push(Op::Label(label));
            }
            "J" => program.ops.push(Op::Jump(field(1).parse().unwrap())),
            "T" => program.ops.push(Op::Test {
                name: field(1),
                value: field(2),
                target: field(3).parse().unwrap(),
            }),
            "R" => program.ops.push(Op::Resolve {
                name: field(1),
                value: field(2),
            }),
            other => panic!("unknown op {other:?}"),
        }
    }
    program
}

impl Program {
    /// Execute against an input assignment, returning the resolved outputs.
    /// Panics on a runaway program or a conflicting resolution.
    pub fn run(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        let mut out = HashMap::new();
        let mut pc = 0;
        let mut steps = 0;
        while pc < self.ops.len() {
            steps += 1;
            assert!(steps < 100_000, "runaway pseudocode program");
            match &self.ops[pc] {
                Op::Label(_) => pc += 1,
                Op::Resolve { name, value } => {
                    if let Some(prev) = out.insert(name.clone(), value.clone()) {
                        assert_eq!(&prev, value, "conflicting resolution for {name}");
                    }
                    pc += 1;
                }
                Op::Jump(0) => break,
                Op::Jump(label) => pc = self.labels[label],
                Op::Test {
                    name,
                    value,
                    target,
                } => {
                    if env.get(name) == Some(value) {
                        pc = self.labels[target];
                    } else {
                        pc += 1;
                    }
                }
            }
        }
        out
    }

    /// Every complete input assignment, as (env, tuple-index) pairs.
    pub fn all_assignments(&self) -> Vec<HashMap<String, String>> {
        let mut envs = vec![HashMap::new()];
        for (name, values) in &self.inputs {
            let mut next = Vec::with_capacity(envs.len() * values.len());
            for env in &envs {
                for value in values {
                    let mut env = env.clone();
                    env.insert(name.clone(), value.clone());
                    next.push(env);
                }
            }
            envs = next;
        }
        envs
    }
}
