//! Decides whether a follow-up question should force the structured tool

/// Classifies a question as asking for a new visualization or not
pub trait IntentClassifier: Send + Sync {
    fn wants_visualization(&self, question: &str) -> bool;
}

/// Keyword-based classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntent;

const CODE_KEYWORDS: &[&str] = &["code", "python", "script", "show me the code"];

const QUESTION_KEYWORDS: &[&str] = &[
    "what is the",
    "what's the",
    "explain",
    "why",
    "how does",
    "tell me about",
    "describe",
];

const CHART_NOUNS: &[&str] = &["plot", "chart", "graph"];

const NOVELTY_KEYWORDS: &[&str] = &["another", "different", "new"];

const CREATION_KEYWORDS: &[&str] = &[
    "create",
    "generate",
    "make",
    "draw",
    "build",
    "show me a",
    "can you plot",
    "can you create",
    "another",
    "different",
    "new",
    "alternative",
];

const VISUALIZATION_KEYWORDS: &[&str] = &[
    "plot",
    "chart",
    "graph",
    "visualiz",
    "scatter",
    "histogram",
    "heatmap",
    "box",
    "bar",
    "line",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

impl IntentClassifier for KeywordIntent {
    fn wants_visualization(&self, question: &str) -> bool {
        wants_visualization(question)
    }
}

/// True when the question asks for a new chart.
///
/// Code requests never force the tool. Explanatory questions don't either,
/// unless they explicitly ask for another plot.
pub fn wants_visualization(question: &str) -> bool {
    let q = question.to_lowercase();

    if contains_any(&q, CODE_KEYWORDS) {
        return false;
    }

    let asks_new_chart = contains_any(&q, CHART_NOUNS) && contains_any(&q, NOVELTY_KEYWORDS);
    if contains_any(&q, QUESTION_KEYWORDS) && !asks_new_chart {
        return false;
    }

    contains_any(&q, CREATION_KEYWORDS) && contains_any(&q, VISUALIZATION_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_requests_never_force() {
        assert!(!wants_visualization("Show me the code for another plot"));
        assert!(!wants_visualization("Create a bar chart in Python"));
        assert!(!wants_visualization("give me a script that draws a histogram"));
    }

    #[test]
    fn test_another_plot_forces() {
        assert!(wants_visualization("Can you show another plot?"));
        assert!(wants_visualization("another plot please"));
        assert!(wants_visualization("Why not draw ANOTHER PLOT of sales?"));
    }

    #[test]
    fn test_explanatory_questions_do_not_force() {
        assert!(!wants_visualization("What is the average price?"));
        assert!(!wants_visualization("Explain the bar chart"));
        assert!(!wants_visualization("Why does the histogram look skewed? Make it clearer"));
    }

    #[test]
    fn test_explanatory_question_with_new_chart_forces() {
        assert!(wants_visualization("Explain this and create a new graph by region"));
    }

    #[test]
    fn test_creation_and_visualization_required() {
        assert!(wants_visualization("Create a scatter of price vs units"));
        assert!(wants_visualization("Make a heatmap of correlations"));
        assert!(wants_visualization("can you plot revenue by month"));
        assert!(!wants_visualization("Create a summary table"));
        assert!(!wants_visualization("histogram of ages"));
    }

    #[test]
    fn test_trait_delegates() {
        let classifier: &dyn IntentClassifier = &KeywordIntent;
        assert!(classifier.wants_visualization("draw a line chart"));
        assert!(!classifier.wants_visualization("hello"));
    }
}
