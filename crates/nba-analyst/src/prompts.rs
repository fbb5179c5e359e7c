//! Prompt Templates
//!
//! Model-facing text for the analyst workflow. Templates use `{name}`
//! placeholders filled by [`render`]; fixed turns are plain consts.

/// Rewrites a user question into one data request for a data agent.
/// Placeholders: `{query}`, `{tools}`.
pub const EXTRAPOLATE_QUERY: &str = r"You are routing a basketball question to a data-sourcing agent.

User question: {query}

The data agent can call these functions:
{tools}

Rewrite the question as one concise data request: name the stats the agent should source and any filters (team, player, stat thresholds) that matter. Reply with the request only, no preamble.";

/// Asks the analyst to break the question down into the data points
/// needed to answer it, before any sourcing happens
pub const PLANNING: &str = r"Break the question in this conversation down into the individual data points needed to answer it. For each data point, name the statistic and any filters (team, player, season segment) that apply. Reply with the breakdown only, no commentary.";

/// Asks the analyst whether gathered data answers the question.
/// Placeholders: `{data}`, `{query}`.
pub const DATA_EVAL: &str = r"The research team returned the following data:

{data}

Original question: {query}

Is this data sufficient to answer the question? Start your answer with yes or no, then give a short reason.";

/// Asks the analyst for the final write-up once the data passes evaluation
pub const FINAL_ANALYSIS: &str = r"Using everything gathered in this conversation, write the final answer to the original question. Cite the relevant numbers from the data and keep the answer focused; do not describe the research process.";

/// Fixed turn nudging the analyst to task the research team again
pub const FOLLOW_UP_REQUEST: &str =
    "Please respond with a follow up request to the research team.";

/// Fixed verification turn the CLI sends after every answer
pub const DOUBLE_CHECK: &str = "Are you sure this is correct? Can you check this answer please?";

/// Fill `{name}` placeholders in a template
///
/// Unknown placeholders are left untouched so a missing variable shows
/// up in the rendered text instead of vanishing.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}
