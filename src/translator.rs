use crate::{
    ast::{Command::*, Segment::*, *},
    context::TranslationContext,
    depth::{DepthError, StackTracker},
    error::TranslateError,
    statics::STATIC_CAPACITY,
};

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

/// Largest value an A-instruction can load.
pub const MAX_CONSTANT: u16 = 32767;

/// Joins emitted lines into the text of an `.asm` file.
pub fn render(lines: &[String]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn push_d() -> Vec<String> {
    svec![
        "// push the value into stack",
        "@SP",
        "A=M",
        "M=D",
        "@SP",
        "M=M+1"
    ]
}

fn pop_to_d() -> Vec<String> {
    svec![
        "// get the top element of stack",
        "@SP",
        "M=M-1",
        "A=M",
        "D=M"
    ]
}

/// Push microcode for segments addressed as `base + arg`.
/// `load` is `D=M` when base holds a pointer, `D=A` when base is the address itself.
fn seg_push(base: &str, load: &str, arg: u16) -> Vec<String> {
    [
        svec![format!("@{}", base), load, format!("@{}", arg), "A=D+A", "D=M"],
        push_d(),
    ]
    .concat()
}

fn seg_pop(base: &str, load: &str, arg: u16) -> Vec<String> {
    [
        svec![
            format!("@{}", base),
            load,
            format!("@{}", arg),
            "D=D+A",
            "// store the result temporarily",
            "@R13",
            "M=D"
        ],
        pop_to_d(),
        svec!["// store the top value", "@R13", "A=M", "M=D"],
    ]
    .concat()
}

/// Leaves the first operand in D and A pointing at the second (R14).
/// R13/R14 only hold meaning until the end of the current command.
fn bin_prelude() -> Vec<String> {
    [
        pop_to_d(),
        svec!["// store the result temporarily", "@R14", "M=D"],
        pop_to_d(),
        svec![
            "// store the result temporarily",
            "@R13",
            "M=D",
            "@R13",
            "D=M",
            "@R14"
        ],
    ]
    .concat()
}

// i.e. no conditions or jumps, just pop, combine and push
fn simple_bin_op(op: char) -> Vec<String> {
    [bin_prelude(), svec![format!("D=D{}M", op)], push_d()].concat()
}

fn simple_un_op(compute: Vec<String>) -> Vec<String> {
    [pop_to_d(), compute, push_d()].concat()
}

fn validate(command: &Command) -> Result<(), String> {
    match command {
        Push(Constant, n) if *n > MAX_CONSTANT => Err(format!(
            "constant {} exceeds the largest loadable value {}",
            n, MAX_CONSTANT
        )),
        Push(Pointer, i) | Pop(Pointer, i) if *i > 1 => {
            Err(format!("pointer index must be 0 or 1, got {}", i))
        }
        Push(Temp, i) | Pop(Temp, i) if *i > 7 => {
            Err(format!("temp index must be in 0..=7, got {}", i))
        }
        Label(sym) | Goto(sym) | IfGoto(sym) if sym.is_empty() => {
            Err("label name is empty".to_string())
        }
        _ => Ok(()),
    }
}

/// Single-pass VM to Hack assembly code generator for one module.
///
/// Each command expands to a `// vm command:<command>` line, its
/// instructions and a blank separator line. The generator tracks the
/// logical stack depth and refuses to emit code for a command whose
/// operands are not on the stack.
pub struct CodeGenerator {
    ctx: TranslationContext,
    stack: StackTracker,
    position: usize,
}

impl CodeGenerator {
    pub fn new(ctx: TranslationContext) -> Self {
        CodeGenerator {
            ctx,
            stack: StackTracker::new(),
            position: 0,
        }
    }

    pub fn for_module(module: impl Into<String>) -> Self {
        Self::new(TranslationContext::new(module))
    }

    pub fn context(&self) -> &TranslationContext {
        &self.ctx
    }

    /// Logical number of values on the stack after the commands seen so far,
    /// or `None` inside code only reachable through a label whose entry
    /// depth is not settled yet.
    pub fn depth(&self) -> Option<usize> {
        self.stack.known()
    }

    /// Translates a whole command sequence, returning no output on error.
    pub fn translate(&mut self, commands: &[Command]) -> Result<Vec<String>, TranslateError> {
        let mut instructions: Vec<String> = vec![];

        for command in commands {
            instructions.extend(self.emit(command)?);
        }

        Ok(instructions)
    }

    /// Lazily translates `commands`, one command at a time.
    pub fn lines<I>(self, commands: I) -> Lines<I::IntoIter>
    where
        I: IntoIterator<Item = Command>,
    {
        Lines {
            generator: self,
            commands: commands.into_iter(),
            pending: Vec::new().into_iter(),
            failed: false,
        }
    }

    /// Emits the framed assembly for a single command.
    pub fn emit(&mut self, command: &Command) -> Result<Vec<String>, TranslateError> {
        let position = self.position;
        self.position += 1;
        log::trace!("#{} {} (depth {:?})", position, command, self.depth());

        validate(command).map_err(|reason| TranslateError::MalformedCommand {
            position,
            command: command.clone(),
            reason,
        })?;

        self.stack.step(command).map_err(|e| match e {
            DepthError::Underflow {
                required,
                available,
            } => TranslateError::StackUnderflow {
                position,
                command: command.clone(),
                required,
                available,
            },
            DepthError::Mismatch(reason) => TranslateError::MalformedCommand {
                position,
                command: command.clone(),
                reason,
            },
        })?;

        let body = match command {
            Push(seg, arg) => self.push(*seg, *arg, position)?,
            Pop(seg, arg) => self.pop(*seg, *arg, position)?,
            Not => simple_un_op(svec!["D=!D"]),
            Neg => simple_un_op(svec!["@0", "D=A-D"]),
            Add => simple_bin_op('+'),
            Sub => simple_bin_op('-'),
            And => simple_bin_op('&'),
            Or => simple_bin_op('|'),
            Eq => self.compare("EQ"),
            Gt => self.compare("GT"),
            Lt => self.compare("LT"),
            Label(sym) => self.label(sym),
            Goto(sym) => self.goto(sym),
            IfGoto(sym) => self.if_goto(sym),
        };


        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(format!("// vm command:{}", command));
        lines.extend(body);
        lines.push(String::new());
        Ok(lines)
    }

    fn static_symbol(&mut self, arg: u16, position: usize) -> Result<String, TranslateError> {
        match self.ctx.statics_mut().resolve(arg).map(str::to_string) {
            Some(symbol) => Ok(symbol),
            None => Err(TranslateError::UnresolvedStatic {
                position,
                module: self.ctx.module().to_string(),
                index: arg,
                capacity: STATIC_CAPACITY,
            }),
        }
    }

    fn push(
        &mut self,
        seg: Segment,
        arg: u16,
        position: usize,
    ) -> Result<Vec<String>, TranslateError> {
        Ok(match seg {
            Constant => [svec![format!("@{}", arg), "D=A"], push_d()].concat(),
            Static => {
                let symbol = self.static_symbol(arg, position)?;
                [svec![format!("@{}", symbol), "D=M"], push_d()].concat()
            }
            Temp => seg_push("R5", "D=A", arg),
            Pointer => seg_push("THIS", "D=A", arg),
            Local => seg_push("LCL", "D=M", arg),
            Argument => seg_push("ARG", "D=M", arg),
            This => seg_push("THIS", "D=M", arg),
            That => seg_push("THAT", "D=M", arg),
        })
    }

    fn pop(
        &mut self,
        seg: Segment,
        arg: u16,
        position: usize,
    ) -> Result<Vec<String>, TranslateError> {
        Ok(match seg {
            Static => {
                let symbol = self.static_symbol(arg, position)?;
                [pop_to_d(), svec![format!("@{}", symbol), "M=D"]].concat()
            }
            Temp => seg_pop("5", "D=A", arg),
            Pointer => seg_pop("THIS", "D=A", arg),
            Local => seg_pop("LCL", "D=M", arg),
            Argument => seg_pop("ARG", "D=M", arg),
            This => seg_pop("THIS", "D=M", arg),
            That => seg_pop("THAT", "D=M", arg),
            Constant => {
                return Err(TranslateError::MalformedCommand {
                    position,
                    command: Pop(seg, arg),
                    reason: "cannot pop into the constant segment".to_string(),
                })
            }
        })
    }

    fn compare(&mut self, cmp: &str) -> Vec<String> {
        let n = self.ctx.next_label();
        let cmp_sym = format!("{}:{}{}", self.ctx.module(), cmp, n);
        let end_sym = format!("{}:END{}{}", self.ctx.module(), cmp, n);
        [
            bin_prelude(),
            svec!["D=D-M", format!("@{}", cmp_sym), format!("D;J{}", cmp)],
            svec![
                "// push the value into stack",
                "@SP",
                "A=M",
                "M=0",
                "@SP",
                "M=M+1"
            ],
            svec![format!("@{}", end_sym), "0;JMP", format!("({})", cmp_sym)],
            svec![
                "// push the value into stack",
                "@SP",
                "A=M",
                "M=-1",
                "@SP",
                "M=M+1"
            ],
            svec![format!("({})", end_sym)],
        ]
        .concat()
    }

    /// Convert VM label to Hack ASM symbol - for consistency across instructions
    fn label_to_sym(&self, label: &str) -> String {
        format!("{}:LABEL_{}", self.ctx.module(), label)
    }

    fn label(&self, label: &str) -> Vec<String> {
        svec![format!("({})", self.label_to_sym(label))]
    }

    fn goto(&self, label: &str) -> Vec<String> {
        svec![
            format!("@{}", self.label_to_sym(label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<String> {
        [
            pop_to_d(),
            svec![
                format!("@{}", self.label_to_sym(label)),
                "D;JNE" // False is 0
            ],
        ]
        .concat()
    }
}

/// Iterator returned by [`CodeGenerator::lines`].
///
/// Yields every line of each command before reading the next one. After an
/// error it yields nothing more.
pub struct Lines<I> {
    generator: CodeGenerator,
    commands: I,
    pending: std::vec::IntoIter<String>,
    failed: bool,
}

impl<I: Iterator<Item = Command>> Iterator for Lines<I> {
    type Item = Result<String, TranslateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.next() {
                return Some(Ok(line));
            }
            if self.failed {
                return None;
            }
            let command = self.commands.next()?;
            match self.generator.emit(&command) {
                Ok(lines) => self.pending = lines.into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
