//! Prompt text for the structured IPC answer.

use super::section::QuestionKind;

/// Grounding text sent when retrieval found nothing.
pub const NO_CONTEXT_NOTE: &str =
    "No relevant documents were retrieved. Relying on general IPC knowledge.";

/// Formatting instructions sent as the system prompt.
pub const SYSTEM_PROMPT: &str = "\
You are an experienced legal expert on the Indian Penal Code (IPC). You present IPC section \
information in a clear, concise and strictly structured format.

Opening line:
- If the Original Question asks whether a particular action or scenario is an offence \
(for example \"someone trespasses on a burial ground\" or \"is it legal to hit someone?\"), \
start with exactly one line of the form
  \"Yes, <brief answer> under Section <number> IPC.\" or \"No, <brief answer> under Section <number> IPC.\"
  choosing Yes or No by whether the action is an offence.
- If the Original Question names an IPC section number, do not write a Yes/No line. \
Start directly with the \"Section <number> IPC:\" line.
- For any other question, omit the Yes/No line.

Answer template, in this order:

Section <number> IPC: <official title of the section>

Explanation:
<2-3 sentences in plain English on the scope and purpose of the section.>

Key Details:
- <essential element or condition>
- <essential element or condition>
- <essential element or condition; give fewer when fewer apply>

Punishment:
<the exact punishment clause, with imprisonment terms written as numbers and any fine.>

Example Case Study:
- <a hypothetical scenario of 1-2 sentences where the section applies.>

Relevant Sections:
<other IPC sections commonly read with this one. Leave out this heading entirely when there are none.>

Choosing the section:
1. A section number named in the Original Question is authoritative, whatever the Raw Content says.
2. Otherwise, if the Raw Content directly and completely covers the section the question implies, \
use it as the primary source for every field.
3. If the Raw Content is insufficient, ambiguous, or about a different section than the question \
implies, answer for the requested section from your own knowledge of the IPC and ignore the \
misleading parts of the Raw Content.

Rules:
- Keep the exact headings, bullets and order shown above.
- Be brief in every field.
- Remove external citations such as (1999) or [12].";

/// Builds the user prompt carrying the question and the grounding text.
#[must_use]
pub fn user_prompt(question: &str, context: &str, kind: &QuestionKind) -> String {
    let context = if context.trim().is_empty() {
        NO_CONTEXT_NOTE
    } else {
        context
    };
    let mut prompt = format!("Original Question: {question}\n");
    match kind {
        QuestionKind::ExplicitSection { section } => {
            prompt.push_str(&format!(
                "Note: the question names Section {section} IPC. Answer for that section and begin with \"Section {section} IPC:\".\n"
            ));
        }
        QuestionKind::YesNo => prompt.push_str(
            "Note: the question asks whether something is an offence. Begin with the Yes/No line.\n",
        ),
        QuestionKind::General => {}
    }
    prompt.push_str("Raw Content for Formatting:\n");
    prompt.push_str(context);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_uses_fallback_note() {
        let prompt = user_prompt("What is theft?", "  ", &QuestionKind::General);
        assert!(prompt.starts_with("Original Question: What is theft?\n"));
        assert!(prompt.ends_with(NO_CONTEXT_NOTE));
    }

    #[test]
    fn context_follows_question() {
        let prompt = user_prompt("q", "Section 378. Theft.", &QuestionKind::General);
        assert_eq!(
            prompt,
            "Original Question: q\nRaw Content for Formatting:\nSection 378. Theft."
        );
    }

    #[test]
    fn directives_follow_question_kind() {
        let named = user_prompt(
            "What is Section 302 IPC?",
            "ctx",
            &QuestionKind::ExplicitSection {
                section: "302".into(),
            },
        );
        assert!(named.contains("begin with \"Section 302 IPC:\""));

        let verdict = user_prompt("Is it a crime?", "ctx", &QuestionKind::YesNo);
        assert!(verdict.contains("Yes/No line"));
    }

    #[test]
    fn system_prompt_lists_every_heading() {
        for heading in [
            "Explanation:",
            "Key Details:",
            "Punishment:",
            "Example Case Study:",
            "Relevant Sections:",
        ] {
            assert!(SYSTEM_PROMPT.contains(heading), "{heading}");
        }
    }
}
