use crate::providers::Answer;

/// Prompt for the merge call.
///
/// Draft A always comes first so the merged text does not depend on which
/// backend responded first. The instructions keep the reply in the
/// assistant's own voice with no mention of where the drafts came from.
pub fn build(assistant_name: &str, question: &str, draft_a: &Answer, draft_b: &Answer) -> String {
    format!(
        "You are {name} AI. A user asked:\n\
         {question}\n\
         \n\
         You received two drafts of a response.\n\
         \n\
         Response A: {a}\n\
         Response B: {b}\n\
         \n\
         Merge them into one clear, intelligent, natural-sounding reply. \
         Do not mention the drafts, where they came from, or any AI model or \
         company. Just respond as {name}.",
        name = assistant_name,
        question = question,
        a = draft_a.text(),
        b = draft_b.text(),
    )
}
