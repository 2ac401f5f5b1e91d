//! Static, hand-curated exemplar phrases per classifiable kind. Embedded once
//! and cached by the classifier; extend this table as misclassifications
//! surface in practice, not speculatively.

use ram_core::Kind;

const IDENTITY: &[&str] = &[
    "my name is",
    "I am a software engineer",
    "I live in",
    "I was born in",
    "my email address is",
    "I work at",
    "my role on this team is",
    "I prefer to be called",
];

const TASK: &[&str] = &[
    "remind me to",
    "todo: finish the report",
    "I need to fix the bug before Friday",
    "schedule a meeting with",
    "follow up on the pull request",
    "next step is to deploy",
    "action item: update the dependency",
    "don't forget to send the invoice",
];

const KNOWLEDGE: &[&str] = &[
    "the speed of light is approximately 299792458 meters per second",
    "in Rust, ownership rules prevent data races at compile time",
    "the capital of France is Paris",
    "water boils at 100 degrees Celsius at sea level",
    "a binary search runs in logarithmic time",
    "the mitochondria is the powerhouse of the cell",
    "TCP guarantees ordered, reliable delivery of a byte stream",
    "photosynthesis converts light energy into chemical energy",
];

const REFERENCE: &[&str] = &[
    "see the design doc at",
    "link to the pull request:",
    "the API documentation is at",
    "according to the RFC",
    "cited from the paper titled",
    "source: internal wiki page",
    "as described in the changelog",
    "full spec available at this url",
];

const NOTE: &[&str] = &[
    "just a quick thought about the UI",
    "random idea: maybe we should cache this",
    "observation: the logs look noisy today",
    "musing on the naming of this function",
    "thinking out loud about the architecture",
    "small aside: the tests are flaky on CI",
    "note to self, nothing actionable here",
    "interesting that this pattern keeps showing up",
];

pub fn exemplars(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Identity => IDENTITY,
        Kind::Task => TASK,
        Kind::Knowledge => KNOWLEDGE,
        Kind::Reference => REFERENCE,
        Kind::Note => NOTE,
        Kind::Unclassified => &[],
    }
}
