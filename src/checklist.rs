use serde::{Deserialize, Serialize};

/// The three things a student ticks off per course each week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistItem {
    Attendance,
    Task,
    Discussion,
}

impl ChecklistItem {
    pub fn column(self) -> &'static str {
        match self {
            ChecklistItem::Attendance => "attendance",
            ChecklistItem::Task => "task",
            ChecklistItem::Discussion => "discussion",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub attendance: bool,
    pub task: bool,
    pub discussion: bool,
}

impl Checklist {
    pub fn get(&self, item: ChecklistItem) -> bool {
        match item {
            ChecklistItem::Attendance => self.attendance,
            ChecklistItem::Task => self.task,
            ChecklistItem::Discussion => self.discussion,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub attendance: usize,
    pub tasks: usize,
    pub discussions: usize,
}

impl Summary {
    pub fn tally<'a>(lists: impl IntoIterator<Item = &'a Checklist>) -> Self {
        lists.into_iter().fold(Summary::default(), |mut s, c| {
            s.attendance += c.attendance as usize;
            s.tasks += c.task as usize;
            s.discussions += c.discussion as usize;
            s
        })
    }
}
