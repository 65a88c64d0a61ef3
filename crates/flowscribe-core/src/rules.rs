/// Flowchart grammar the sanitizer enforces. Shared with the generator's system instruction
/// so the model is asked for exactly what survives normalization.
pub const RULES: &str = "\
1. The first line is the header: `graph TD;` (top-down) or `graph LR;` (left-right), ending with a semicolon.\n\
2. Every other line is one statement: either a node or an edge. No blank lines, no comments, \
no subgraphs, no style or class directives.\n\
3. A node is an identifier followed by a label in square brackets, e.g. `A[Receive order]`. \
Identifiers use letters, digits and underscores only.\n\
4. An edge joins two nodes with an arrow, e.g. `A[Start] --> B[Check stock]` or `A --> B`. \
Use `-->` for normal flow, `-.->` for optional flow and `==>` for emphasis.\n\
5. Edge labels go between pipes: `B -->|in stock| C[Ship]`.\n\
6. Labels are short plain text. Avoid quotes, parentheses, brackets, braces, semicolons and \
other punctuation inside labels; split long lists into separate nodes instead.\n\
7. Decisions are ordinary square-bracket nodes phrased as a question, e.g. `C[Payment ok?]`. \
Curly-brace shapes are not allowed.\n\
8. Each node is defined once with its label; later references use the bare identifier.";
