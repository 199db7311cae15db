// Prompt template for social-media content generation.
//
// One prompt per job: the article URL, the stance to take, and the 13
// branches to write for. The model is told to answer with a single JSON
// object so the response can be pulled out of whatever prose surrounds it.

use newsangle_core::model::{Stance, BRANCHES, BRANCH_COUNT};

/// How the stance is phrased to the model.
fn stance_instruction(stance: Stance) -> &'static str {
    match stance {
        Stance::Pro => {
            "Take a SUPPORTIVE position: endorse the article's main claims and \
             argue in favour of the policy or action it describes."
        }
        Stance::Anti => {
            "Take an OPPOSING position: challenge the article's main claims and \
             argue against the policy or action it describes."
        }
    }
}

/// Build the full prompt for one generation job.
pub fn build_generation_prompt(source_url: &str, stance: Stance) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are a political communications writer producing social media content \
         from a news article.\n\n",
    );

    prompt.push_str("## ARTICLE\n");
    prompt.push_str(&format!(
        "URL: {source_url}\n\
         Read the article at this URL and base all content on its facts.\n\n"
    ));

    prompt.push_str(&format!("## STANCE: {}\n", stance.as_str()));
    prompt.push_str(stance_instruction(stance));
    prompt.push_str("\n\n");

    prompt.push_str(&format!("## BRANCHES ({BRANCH_COUNT})\n"));
    for (i, branch) in BRANCHES.iter().enumerate() {
        prompt.push_str(&format!("{}. {branch}\n", i + 1));
    }
    prompt.push('\n');

    prompt.push_str(&format!(
        "## TASK\n\
         For EACH of the {BRANCH_COUNT} branches above, write:\n\
         - facebookPost: a Facebook post of 2-4 short paragraphs framed for that branch's audience\n\
         - tweet: a tweet of at most 280 characters, including hashtags\n\n"
    ));

    prompt.push_str(&format!(
        "## OUTPUT FORMAT\n\
         Respond with ONLY one JSON object, no markdown fences and no commentary:\n\
         {{\"contentPairs\": [{{\"branch\": \"<branch name>\", \"facebookPost\": \"<post>\", \"tweet\": \"<tweet>\"}}]}}\n\
         The contentPairs array must contain exactly {BRANCH_COUNT} entries, one per branch, \
         in the order listed, using the branch names exactly as written.\n"
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_url_and_every_branch() {
        let prompt = build_generation_prompt("https://news.example/story-1", Stance::Pro);

        assert!(prompt.contains("URL: https://news.example/story-1"));
        for branch in BRANCHES {
            assert!(prompt.contains(branch), "missing branch {branch}");
        }
        assert!(prompt.contains("13. Housing"));
    }

    #[test]
    fn prompt_states_stance() {
        let pro = build_generation_prompt("https://news.example/a", Stance::Pro);
        assert!(pro.contains("## STANCE: PRO"));
        assert!(pro.contains("SUPPORTIVE"));
        assert!(!pro.contains("OPPOSING"));

        let anti = build_generation_prompt("https://news.example/a", Stance::Anti);
        assert!(anti.contains("## STANCE: ANTI"));
        assert!(anti.contains("OPPOSING"));
    }

    #[test]
    fn prompt_specifies_json_shape_and_count() {
        let prompt = build_generation_prompt("https://news.example/a", Stance::Anti);
        assert!(prompt.contains(r#"{"contentPairs": [{"branch""#));
        assert!(prompt.contains("\"facebookPost\""));
        assert!(prompt.contains("\"tweet\""));
        assert!(prompt.contains("exactly 13 entries"));
        assert!(prompt.contains("280 characters"));
    }
}
