//! A small Hack CPU used to execute translated programs in tests.
#![allow(dead_code)]

use std::collections::HashMap;

pub const STACK_BASE: usize = 256;

#[derive(Debug, Clone)]
enum Instr {
    A(u16),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

pub struct Hack {
    rom: Vec<Instr>,
    pub ram: Vec<i16>,
    symbols: HashMap<String, u16>,
    a: i16,
    d: i16,
    pc: usize,
}

impl Hack {
    /// Assembles `lines` and sets SP to the stack base. LCL/ARG/THIS/THAT get
    /// the values the course's segment tests use.
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut symbols: HashMap<String, u16> = [
            ("SP", 0),
            ("LCL", 1),
            ("ARG", 2),
            ("THIS", 3),
            ("THAT", 4),
            ("SCREEN", 16384),
            ("KBD", 24576),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        for r in 0..16 {
            symbols.insert(format!("R{}", r), r);
        }

        let code: Vec<&str> = lines
            .iter()
            .map(|l| {
                let l = l.as_ref();
                l.split_once("//").map(|(s, _)| s).unwrap_or(l).trim()
            })
            .filter(|l| !l.is_empty())
            .collect();

        // first pass: labels
        let mut address = 0u16;
        for line in &code {
            if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                assert!(
                    symbols.insert(label.to_string(), address).is_none(),
                    "duplicate label {}",
                    label
                );
            } else {
                address += 1;
            }
        }

        // second pass: instructions, variables from 16 in order of appearance
        let mut next_var = 16u16;
        let mut rom = vec![];
        for line in code {
            if line.starts_with('(') {
                continue;
            }
            if let Some(target) = line.strip_prefix('@') {
                let value = match target.parse::<u16>() {
                    Ok(n) => n,
                    Err(_) => *symbols.entry(target.to_string()).or_insert_with(|| {
                        next_var += 1;
                        next_var - 1
                    }),
                };
                rom.push(Instr::A(value));
            } else {
                let (dest, rest) = line.split_once('=').unwrap_or(("", line));
                let (comp, jump) = rest.split_once(';').unwrap_or((rest, ""));
                rom.push(Instr::C {
                    dest: dest.to_string(),
                    comp: comp.to_string(),
                    jump: jump.to_string(),
                });
            }
        }

        let mut ram = vec![0i16; 32768];
        ram[0] = STACK_BASE as i16;
        ram[1] = 300;
        ram[2] = 400;
        ram[3] = 3000;
        ram[4] = 3010;

        Hack {
            rom,
            ram,
            symbols,
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    fn comp(&self, comp: &str) -> i16 {
        let (a, d) = (self.a, self.d);
        let m = self.ram.get(a as u16 as usize).copied().unwrap_or(0);
        match comp {
            "0" => 0,
            "1" => 1,
            "-1" => -1,
            "D" => d,
            "A" => a,
            "M" => m,
            "!D" => !d,
            "!A" => !a,
            "!M" => !m,
            "-D" => d.wrapping_neg(),
            "-A" => a.wrapping_neg(),
            "-M" => m.wrapping_neg(),
            "D+1" => d.wrapping_add(1),
            "A+1" => a.wrapping_add(1),
            "M+1" => m.wrapping_add(1),
            "D-1" => d.wrapping_sub(1),
            "A-1" => a.wrapping_sub(1),
            "M-1" => m.wrapping_sub(1),
            "D+A" | "A+D" => d.wrapping_add(a),
            "D+M" | "M+D" => d.wrapping_add(m),
            "D-A" => d.wrapping_sub(a),
            "D-M" => d.wrapping_sub(m),
            "A-D" => a.wrapping_sub(d),
            "M-D" => m.wrapping_sub(d),
            "D&A" | "A&D" => d & a,
            "D&M" | "M&D" => d & m,
            "D|A" | "A|D" => d | a,
            "D|M" | "M|D" => d | m,
            other => panic!("unsupported comp {}", other),
        }
    }

    fn step(&mut self) {
        match self.rom[self.pc].clone() {
            Instr::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let out = self.comp(&comp);
                // M is written through the A held before this instruction
                if dest.contains('M') {
                    self.ram[self.a as u16 as usize] = out;
                }
                if dest.contains('A') {
                    self.a = out;
                }
                if dest.contains('D') {
                    self.d = out;
                }
                let taken = match jump.as_str() {
                    "" => false,
                    "JGT" => out > 0,
                    "JEQ" => out == 0,
                    "JGE" => out >= 0,
                    "JLT" => out < 0,
                    "JNE" => out != 0,
                    "JLE" => out <= 0,
                    "JMP" => true,
                    other => panic!("unsupported jump {}", other),
                };
                self.pc = if taken { self.a as u16 as usize } else { self.pc + 1 };
            }
        }
    }

    /// Runs until the program counter leaves the program.
    pub fn run(&mut self) -> &mut Self {
        let mut steps = 0;
        while self.pc < self.rom.len() {
            self.step();
            steps += 1;
            assert!(steps < 1_000_000, "program did not terminate");
        }
        self
    }

    pub fn sp(&self) -> usize {
        self.ram[0] as usize
    }

    /// Values between the stack base and SP, bottom first.
    pub fn stack(&self) -> Vec<i16> {
        self.ram[STACK_BASE..self.sp()].to_vec()
    }

    /// Value stored at a symbol's address, if the program used the symbol.
    pub fn symbol(&self, name: &str) -> Option<i16> {
        self.symbols.get(name).map(|&addr| self.ram[addr as usize])
    }

    pub fn address_of(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }
}

/// Translates `source` as `module` and executes it.
pub fn execute(module: &str, source: &str) -> Hack {
    let lines = vmil::translate_source(module, source).expect("translation failed");
    let mut hack = Hack::new(&lines);
    hack.run();
    hack
}
