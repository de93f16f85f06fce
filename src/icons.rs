//! Topic → icon asset lookup.

/// What to draw next to a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicIcon {
    Asset(&'static str),
    Generic,
}

impl TopicIcon {
    pub fn asset(self) -> Option<&'static str> {
        match self {
            TopicIcon::Asset(file) => Some(file),
            TopicIcon::Generic => None,
        }
    }
}

/// Sorted by topic so lookups can binary search. Keys are lowercase.
const ICONS: &[(&str, &str)] = &[
    ("ai", "ai.svg"),
    ("bootstrap", "bootstrap.svg"),
    ("chromadb", "chroma.svg"),
    ("cloud", "cloud.svg"),
    ("css", "css.svg"),
    ("css3", "css3.svg"),
    ("django", "django.svg"),
    ("docker", "docker.png"),
    ("express", "express.webp"),
    ("figma", "figma.svg"),
    ("flask", "flask-light.svg"),
    ("git", "git.svg"),
    ("github", "github.svg"),
    ("gradio", "gradio.svg"),
    ("html", "html.svg"),
    ("js", "js.svg"),
    ("kubernetes", "kubernetes.svg"),
    ("langchain", "langchain.svg"),
    ("laravel", "laravel.svg"),
    ("leetcode", "leetcode.png"),
    ("llamaindex", "llamaindex.svg"),
    ("mongodb", "mongodb.svg"),
    ("mysql", "mysql.png"),
    ("node", "nodeSVG.svg"),
    ("php", "php.svg"),
    ("postgresql", "postgresql.svg"),
    ("prisma", "prisma.svg"),
    ("python", "python.svg"),
    ("react", "react.svg"),
    ("redux", "redux.svg"),
    ("sass", "sass.svg"),
    ("security", "security.svg"),
    ("shadcn", "shadcn.png"),
    ("socket.io", "socket-io.svg"),
    ("sql", "sqlSVG.svg"),
    ("tailwind", "tailwind.svg"),
    ("terminal", "terminal.svg"),
    ("typescript", "typescript.svg"),
    ("vite", "vite.svg"),
];

pub fn icon_for(topic: &str) -> TopicIcon {
    let key = topic.trim().to_lowercase();
    match ICONS.binary_search_by(|(name, _)| (*name).cmp(key.as_str())) {
        Ok(index) => TopicIcon::Asset(ICONS[index].1),
        Err(_) => TopicIcon::Generic,
    }
}
