/// A top-level or nested statement
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Call of a named builtin: `name('a', "b", [[c]])`
    FunctionCall(FunctionCall),
    /// `do ... end`
    DoBlock(DoBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// String literal arguments, in source order
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoBlock {
    pub body: Vec<Node>,
}

impl Node {
    pub fn call<S: Into<String>>(name: &str, arguments: impl IntoIterator<Item = S>) -> Self {
        Node::FunctionCall(FunctionCall {
            name: name.to_string(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        })
    }

    pub fn block(body: Vec<Node>) -> Self {
        Node::DoBlock(DoBlock { body })
    }

    /// Short human-readable name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::FunctionCall(_) => "function call",
            Node::DoBlock(_) => "do block",
        }
    }
}
