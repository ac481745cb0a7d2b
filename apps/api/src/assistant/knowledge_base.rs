//! Fixed table of recognised intents and their canned answers.

/// A recognised intent. Keywords are lowercase phrases matched as substrings of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

/// Declaration order is observable: equal scores resolve to the earlier entry.
pub const KNOWLEDGE_BASE: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        keywords: &[
            "find talent",
            "search worker",
            "hire",
            "find professional",
            "looking for employee",
            "find worker",
        ],
        response: "To find talent, please visit the 'Find Talent' section (#workers) on our home page. You can use the search bar to filter professionals by skill or location.",
    },
    KnowledgeEntry {
        keywords: &[
            "post job",
            "post a job",
            "create job",
            "hiring",
            "new job",
            "vacancy",
        ],
        response: "You can post a new job opening by filling out the form in the 'Post Jobs' section (#job-form). Make sure to include all relevant details to attract the best candidates.",
    },
    KnowledgeEntry {
        keywords: &["about", "what is ivo", "mission", "platform info"],
        response: "IVO is a professional network and job board designed to connect skilled individuals with opportunities. We aim to make hiring and job hunting seamless.",
    },
    KnowledgeEntry {
        keywords: &["contact", "email", "support", "help"],
        response: "You can reach our support team via email at support@ivojobs.com or use the contact form on our main website.",
    },
    KnowledgeEntry {
        keywords: &["register", "sign up", "create account", "join"],
        response: "Click the 'Sign Up' button in the top right corner to create a new account. You can register as a professional or a recruiter.",
    },
    KnowledgeEntry {
        keywords: &["login", "sign in", "log in"],
        response: "Click the 'Log In' button in the top right corner to access your account.",
    },
    KnowledgeEntry {
        keywords: &["hello", "hi", "hey", "greetings"],
        response: "Hello! I am the IVO Assistant. How can I help you today? I can assist with navigation, finding talent, or posting jobs.",
    },
];
