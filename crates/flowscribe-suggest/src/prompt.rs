use flowscribe_core::RepairContext;

pub fn system_prompt() -> String {
    format!(
        "You are an expert in Mermaid flowchart syntax. Turn the user's description of a process, \
system or story into a single Mermaid flowchart.\n\n\
Respond with ONLY one fenced code block tagged `mermaid`, nothing before or after it. \
For example:\n\
```mermaid\n\
graph TD;\n\
A[Receive order] --> B[Check stock];\n\
B -->|in stock| C[Ship order];\n\
B -->|out of stock| D[Notify customer];\n\
```\n\n\
## Grammar\n{}\n\n\
Keep the chart focused: one node per meaningful step, ordered the way the description flows.",
        flowscribe_core::rules::RULES
    )
}

pub fn user_message(prompt: &str) -> String {
    format!("Create a flowchart for the following description:\n\n{}", prompt.trim())
}

/// Ask the model to fix its own output. Both the broken definition and the
/// renderer's complaint go into the prompt text.
pub fn repair_message(prompt: &str, repair: &RepairContext) -> String {
    format!(
        "You previously produced a Mermaid flowchart for this description:\n\n{}\n\n\
The renderer rejected it. Definition:\n\
```mermaid\n{}```\n\n\
Renderer error:\n{}\n\n\
Return a corrected flowchart that follows the grammar exactly.",
        prompt.trim(),
        repair.definition,
        repair.diagnostic.trim()
    )
}
