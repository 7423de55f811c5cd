use crate::ast::*;

use super::{error::GenerationError, label_generator::*, name_generator::*, tac::*};

/// Generate a three-address code listing for every function of a
/// program, with the top-level code appearing last under
/// [`TOP_LEVEL_FUNCTION`].
pub fn generate(program: &Program) -> Result<TacProgram, GenerationError> {
    let mut generator = TacGenerator::new();
    let mut tac = TacProgram::new();

    for def in &program.functions {
        tac.functions
            .push((def.name.clone(), generator.lower_function(def)?));
    }
    tac.functions.push((
        TOP_LEVEL_FUNCTION.to_string(),
        generator.lower_top_level(&program.top_level, &program.result)?,
    ));

    Ok(tac)
}

/// Lowers program trees to flat instruction listings, one function at a
/// time. Evaluation is left-to-right post-order: every expression
/// lowering returns the operand holding its result, so lowering one
/// subtree is independent of any other. Temporary and label counters
/// persist across the functions of one run, which makes generation
/// fully deterministic.
pub struct TacGenerator {
    instructions: TacListing,
    names: NameGenerator,
    labels: LabelGenerator,
}
impl TacGenerator {
    pub fn new() -> Self {
        Self {
            instructions: TacListing::new(),
            names: NameGenerator::new(),
            labels: LabelGenerator::new(),
        }
    }

    /// Lower one function definition: its body block, then its return
    /// expression, terminated by a `return` instruction.
    pub fn lower_function(&mut self, def: &FunctionDef) -> Result<TacListing, GenerationError> {
        self.instructions = TacListing::new();
        self.lower_block(&def.body)?;
        let retval = self.lower_value(&def.retval)?;
        self.emit(Instruction::Return(retval));

        Ok(self.take())
    }

    /// Lower the top-level block and the final expression, terminated by
    /// an `output` instruction.
    pub fn lower_top_level(
        &mut self,
        block: &Block,
        result: &ArithExpr,
    ) -> Result<TacListing, GenerationError> {
        self.instructions = TacListing::new();
        self.lower_block(block)?;
        let value = self.lower_value(result)?;
        self.emit(Instruction::Output(value));

        Ok(self.take())
    }

    fn take(&mut self) -> TacListing {
        std::mem::take(&mut self.instructions)
    }

    /// Lower a block. Declarations carry only type information and emit
    /// no code.
    fn lower_block(&mut self, block: &Block) -> Result<(), GenerationError> {
        for stmt in &block.stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Statement) -> Result<(), GenerationError> {
        match stmt {
            Statement::Assign { target, value } => {
                // Assignments are expressions; the assigned variable is
                // the result, discarded in statement position.
                self.lower_assign(target, value)?;
            }
            Statement::If {
                guard,
                true_branch,
                false_branch,
            } => self.lower_cond(guard, true_branch, false_branch)?,
            Statement::While { guard, body } => self.lower_loop(guard, body)?,
        }
        Ok(())
    }

    /// Lower an assignment, returning the assigned variable. A call on
    /// the right-hand side becomes a `CALL` into the target; anything
    /// else becomes a copy.
    fn lower_assign(
        &mut self,
        target: &str,
        value: &ArithExpr,
    ) -> Result<Operand, GenerationError> {
        let dst = Operand::Var(target.to_string());
        match value {
            ArithExpr::Call(call) => {
                let callee = self.lower_call(call)?;
                self.emit(Instruction::Call {
                    dst: dst.clone(),
                    callee,
                });
            }
            value => {
                let src = self.lower_value(value)?;
                self.emit(Instruction::Copy {
                    dst: dst.clone(),
                    src,
                });
            }
        }
        Ok(dst)
    }

    /// Lower an arithmetic expression in value position, returning the
    /// operand holding its result. Literals and variable references emit
    /// no code; a call node here violates the generator's contract.
    fn lower_value(&mut self, expr: &ArithExpr) -> Result<Operand, GenerationError> {
        match expr {
            ArithExpr::Integer(value) => Ok(Operand::Const(*value)),
            ArithExpr::Variable(name) => Ok(Operand::Var(name.clone())),
            ArithExpr::Binary { op, lhs, rhs } => {
                let lhs = self.lower_value(lhs)?;
                let rhs = self.lower_value(rhs)?;
                Ok(self.emit_binary((*op).into(), lhs, rhs))
            }
            ArithExpr::Call(call) => Err(GenerationError::CallAsValue(call.callee.clone())),
        }
    }

    /// Lower a relational expression, returning the operand holding its
    /// result.
    fn lower_rel(&mut self, expr: &RelExpr) -> Result<Operand, GenerationError> {
        match expr {
            RelExpr::Compare { op, lhs, rhs } => {
                let lhs = self.lower_value(lhs)?;
                let rhs = self.lower_value(rhs)?;
                Ok(self.emit_binary((*op).into(), lhs, rhs))
            }
            RelExpr::Logical { op, lhs, rhs } => {
                let lhs = self.lower_rel(lhs)?;
                let rhs = self.lower_rel(rhs)?;
                Ok(self.emit_binary((*op).into(), lhs, rhs))
            }
            RelExpr::Not(inner) => {
                let src = self.lower_rel(inner)?;
                let dst = self.names.next_temp();
                self.emit(Instruction::Unary {
                    dst: dst.clone(),
                    op: Opcode::Not,
                    src,
                });
                Ok(dst)
            }
        }
    }

    /// Emit one binary instruction into a fresh temporary and return
    /// the temporary. The temporary is allocated after both operands,
    /// so nested expressions number their temporaries innermost first.
    fn emit_binary(&mut self, op: Opcode, lhs: Operand, rhs: Operand) -> Operand {
        let dst = self.names.next_temp();
        self.emit(Instruction::Binary {
            dst: dst.clone(),
            op,
            lhs,
            rhs,
        });
        dst
    }

    /// Lower a conditional to a guarded jump over the true branch and an
    /// unconditional jump over the false branch.
    fn lower_cond(
        &mut self,
        guard: &RelExpr,
        true_branch: &Block,
        false_branch: &Block,
    ) -> Result<(), GenerationError> {
        let (false_label, end_label) = self.labels.next_pair("IF_FALSE", "IF_END");

        let cond = self.lower_rel(guard)?;
        self.emit(Instruction::JumpIfZero {
            cond,
            target: false_label.clone(),
        });

        self.lower_block(true_branch)?;
        self.emit(Instruction::Jump(end_label.clone()));
        self.emit(Instruction::Label(false_label));

        self.lower_block(false_branch)?;
        self.emit(Instruction::Label(end_label));
        Ok(())
    }

    /// Lower a loop to a guarded jump past the body and a back edge to
    /// the guard.
    fn lower_loop(&mut self, guard: &RelExpr, body: &Block) -> Result<(), GenerationError> {
        let (start_label, end_label) = self.labels.next_pair("WHILE_START", "WHILE_END");

        self.emit(Instruction::Label(start_label.clone()));
        let cond = self.lower_rel(guard)?;
        self.emit(Instruction::JumpIfZero {
            cond,
            target: end_label.clone(),
        });

        self.lower_block(body)?;
        self.emit(Instruction::Jump(start_label));
        self.emit(Instruction::Label(end_label));
        Ok(())
    }

    /// Lower a function call: one `arg` per argument in left-to-right
    /// order, returning a function reference for the enclosing
    /// assignment to consume.
    fn lower_call(&mut self, call: &FunctionCall) -> Result<Operand, GenerationError> {
        for argument in &call.arguments {
            let value = self.lower_value(argument)?;
            self.emit(Instruction::Arg(value));
        }
        Ok(Operand::Function(call.callee.clone()))
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }
}

#[cfg(test)]
mod tests {
    use crate::{lexer::lex, parser::parse};

    use super::*;

    fn generate_source(source: &str) -> TacProgram {
        let tokens = lex(source).unwrap();
        let program = parse(&tokens).unwrap();
        generate(&program).unwrap()
    }

    macro_rules! assert_generates {
        ($source:expr, $il:expr) => {{
            let tac = generate_source($source);
            let listing = tac.listing(TOP_LEVEL_FUNCTION).unwrap();

            let instr_lines: Vec<_> = listing
                .iter_instructions()
                .map(|i| i.to_string())
                .collect();

            assert_eq!(&$il[..], instr_lines)
        }};
    }

    #[test]
    fn straight_line_program_generates_tac() {
        assert_generates!(
            "int a; int x; int y; a := 1; x := a + 2; y := x * a; output y;",
            [
                "a <- 1",
                "_tmp0 <- a ADD 2",
                "x <- _tmp0",
                "_tmp1 <- x MUL a",
                "y <- _tmp1",
                "output y",
            ]
        )
    }

    #[test]
    fn nested_expressions_allocate_temporaries_post_order() {
        assert_generates!(
            "output (1 + 2) * 3;",
            ["_tmp0 <- 1 ADD 2", "_tmp1 <- _tmp0 MUL 3", "output _tmp1"]
        )
    }

    #[test]
    fn conditional_generates_jumps_and_labels() {
        assert_generates!(
            "if (1 < 2) { } output 4;",
            [
                "_tmp0 <- 1 LT 2",
                "jump_if_0 _tmp0 IF_FALSE_0",
                "jump IF_END_0",
                "IF_FALSE_0:",
                "IF_END_0:",
                "output 4",
            ]
        )
    }

    #[test]
    fn loop_generates_back_edge() {
        assert_generates!(
            "while (1 < 2) { } output 4;",
            [
                "WHILE_START_0:",
                "_tmp0 <- 1 LT 2",
                "jump_if_0 _tmp0 WHILE_END_0",
                "jump WHILE_START_0",
                "WHILE_END_0:",
                "output 4",
            ]
        )
    }

    #[test]
    fn control_flow_constructs_share_the_label_counter() {
        assert_generates!(
            "if (1 < 2) { } while (3 < 4) { } output 0;",
            [
                "_tmp0 <- 1 LT 2",
                "jump_if_0 _tmp0 IF_FALSE_0",
                "jump IF_END_0",
                "IF_FALSE_0:",
                "IF_END_0:",
                "WHILE_START_1:",
                "_tmp1 <- 3 LT 4",
                "jump_if_0 _tmp1 WHILE_END_1",
                "jump WHILE_START_1",
                "WHILE_END_1:",
                "output 0",
            ]
        )
    }

    #[test]
    fn logical_guard_generates_unary_and_binary_ops() {
        assert_generates!(
            "if (!(1 < 2) && (3 <= 4)) { } output 0;",
            [
                "_tmp0 <- 1 LT 2",
                "_tmp1 <- ! _tmp0",
                "_tmp2 <- 3 LE 4",
                "_tmp3 <- _tmp1 AND _tmp2",
                "jump_if_0 _tmp3 IF_FALSE_0",
                "jump IF_END_0",
                "IF_FALSE_0:",
                "IF_END_0:",
                "output 0",
            ]
        )
    }

    #[test]
    fn call_generates_args_in_order() {
        let tac = generate_source(
            "def add(int a, int b) : int { return a + b; } int x; x := add(1, 2); output x;",
        );

        let body: Vec<_> = tac
            .listing("add")
            .unwrap()
            .iter_instructions()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(vec!["_tmp0 <- a ADD b", "return _tmp0"], body);

        let top: Vec<_> = tac
            .listing(TOP_LEVEL_FUNCTION)
            .unwrap()
            .iter_instructions()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(vec!["arg 1", "arg 2", "x <- CALL add", "output x"], top);
    }

    #[test]
    fn call_in_value_position_is_rejected() {
        let call = ArithExpr::Call(FunctionCall {
            callee: "f".to_string(),
            arguments: vec![],
        });
        let program = Program {
            functions: vec![],
            top_level: Block::default(),
            result: ArithExpr::Binary {
                op: ArithOp::Add,
                lhs: Box::new(call),
                rhs: Box::new(ArithExpr::Integer(1)),
            },
        };

        assert_eq!(
            GenerationError::CallAsValue("f".to_string()),
            generate(&program).unwrap_err()
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let source = "int x; int y; x := 1 + 2; if (x < 3) { y := x * 2; } output y;";
        let first = generate_source(source).to_string();
        let second = generate_source(source).to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn declarations_emit_no_code() {
        assert_generates!("int a; int b; int c; output 1;", ["output 1"])
    }
}
