//! Abstract syntax tree for the Ember language.
//!
//! Every node is exclusively owned by its parent: the [`Program`] owns the
//! top-level statements, blocks own their statement lists and composite
//! expressions own their operands. Nodes are built by the parser and read
//! (never mutated) by the code generator.

/// A declared type keyword: `int`, `bool` or `string`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Str,
}

impl Type {
    /// Map a type-keyword lexeme to its [`Type`].
    pub fn from_keyword(keyword: &str) -> Option<Type> {
        match keyword {
            "int"    => Some(Type::Int),
            "bool"   => Some(Type::Bool),
            "string" => Some(Type::Str),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int  => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Str  => write!(f, "string"),
        }
    }
}

/// A single function parameter: `name:type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Rem, // %
    Eq,  // ==
    Ne,  // !=
    Lt,  // <
    Gt,  // >
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -x
    Not, // !x
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Increment, // ++
    Decrement, // --
}

/// Compound assignment operators: `=`, `+=`, `-=`, `*=`, `/=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

/// An expression in function bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A binary operation: `1 + 2`
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    /// A unary operation: `-x` or `!x`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// `++x`, `x++`, `--x` or `x--` — the one expression form with a
    /// guaranteed side effect.
    IncDec {
        op: IncDecOp,
        target: String,
        is_prefix: bool,
    },

    /// A variable or function name: `x`
    Identifier(String),

    /// An integer literal, stored as source text: `42`
    IntLiteral(String),

    /// A string literal with escapes already resolved: `"hello"`
    StringLiteral(String),

    /// A boolean literal: `true` or `false`
    BoolLiteral(bool),

    /// A function call: `add(2, 3)`
    Call {
        callee: String,
        args: Vec<Expr>,
    },
}

/// An ordered statement list — always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Local variable declaration: `int x = 42;`
    VarDecl {
        ty: Type,
        name: String,
        init: Expr,
    },

    /// File-scope variable declaration: `int g = 10;`
    GlobalVarDecl {
        ty: Type,
        name: String,
        init: Expr,
    },

    /// Assignment to an existing variable: `x = 1;`, `x += 2;`
    Assign {
        name: String,
        op: AssignOp,
        value: Expr,
    },

    /// `return expr;` or bare `return;`
    Return(Option<Expr>),

    /// An expression evaluated for its side effect: `printf("hi");`
    Expr(Expr),

    /// A braced statement list.
    Block(Block),

    /// `if (cond) { … } else if (cond) { … } else { … }`
    If {
        condition: Expr,
        then_block: Block,
        else_ifs: Vec<(Expr, Block)>,
        else_block: Option<Block>,
    },

    /// `while (cond) { … }`
    While {
        condition: Expr,
        body: Block,
    },

    /// `func name(params):ret { … }` or `func name(params):ret => expr;`
    ///
    /// Arrow bodies are desugared by the parser into a one-statement
    /// return block, so codegen only ever sees block bodies.
    FuncDecl {
        name: String,
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Block,
    },
}

/// A whole source file.
///
/// Invariant, enforced by the parser: only [`Stmt::FuncDecl`] and
/// [`Stmt::GlobalVarDecl`] appear at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
