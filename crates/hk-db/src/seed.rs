//! First-run contents: the default administrator and two sample modules.

use hk_types::{ModuleDraft, QuestionDraft};

/// Username of the account created on first run.
pub const ADMIN_USERNAME: &str = "admin";

/// Fixed first-run administrator password, stored in plain text like every
/// other credential.
pub const ADMIN_PASSWORD: &str = "SpaccoTutto2005";

/// A sample module with its question set.
pub struct SampleModule {
    pub draft: ModuleDraft,
    pub questions: Vec<QuestionDraft>,
}

pub fn sample_modules() -> Vec<SampleModule> {
    vec![linux_fundamentals(), cyber_security_fundamentals()]
}

fn linux_fundamentals() -> SampleModule {
    SampleModule {
        draft: ModuleDraft {
            title: "Linux Fundamentals".into(),
            description: "Master the essential concepts and commands in Linux operating system. \
                          Learn file management, directory navigation, permissions, and basic \
                          system administration."
                .into(),
            category: "Linux".into(),
            difficulty: "Beginner".into(),
            time_limit: 1800,
            passing_score: 70,
            randomize: true,
            instant_feedback: true,
            xp_reward: 100,
            created_by: None,
        },
        questions: vec![
            QuestionDraft::new(
                "What command is used to list files and directories in Linux?",
                ["ls", "dir", "show", "list"],
                0,
            ),
            QuestionDraft::new(
                "Which command is used to change directories?",
                ["cd", "chdir", "move", "goto"],
                0,
            ),
            QuestionDraft::new(
                "What command displays the current working directory?",
                ["pwd", "cwd", "dir", "present"],
                0,
            ),
            QuestionDraft::new(
                "Which command is used to create a new directory?",
                ["mkdir", "newdir", "createdir", "md"],
                0,
            ),
            QuestionDraft::new(
                "What command is used to remove a file?",
                ["rm", "del", "delete", "remove"],
                0,
            ),
        ],
    }
}

fn cyber_security_fundamentals() -> SampleModule {
    SampleModule {
        draft: ModuleDraft {
            title: "Cyber Security Fundamentals".into(),
            description: "Master the core concepts of cybersecurity including CIA triad, \
                          security roles, operating systems, and networking fundamentals."
                .into(),
            category: "Security".into(),
            difficulty: "Beginner".into(),
            time_limit: 2400,
            passing_score: 70,
            randomize: true,
            instant_feedback: true,
            xp_reward: 150,
            created_by: None,
        },
        questions: vec![
            QuestionDraft::new(
                "What are the three main components of the CIA triad?",
                [
                    "Confidentiality, Integrity, Availability",
                    "Control, Implementation, Authentication",
                    "Cryptography, Infrastructure, Access",
                    "Communication, Information, Assurance",
                ],
                0,
            ),
            QuestionDraft::new(
                "Which team is responsible for defending against cyber attacks?",
                ["Blue Team", "Red Team", "Green Team", "Yellow Team"],
                0,
            ),
            QuestionDraft::new(
                "What is the primary responsibility of a CISO?",
                [
                    "Managing the organization's information security program",
                    "Writing code for security applications",
                    "Performing penetration tests",
                    "Monitoring network traffic",
                ],
                0,
            ),
            QuestionDraft::new(
                "Which layer of the OSI model deals with routing and IP addressing?",
                [
                    "Network Layer",
                    "Transport Layer",
                    "Data Link Layer",
                    "Physical Layer",
                ],
                0,
            ),
            QuestionDraft::new(
                "What is the purpose of the DHCP protocol?",
                [
                    "Automatically assign IP addresses to network devices",
                    "Secure network communications",
                    "Transfer files between computers",
                    "Manage email communications",
                ],
                0,
            ),
        ],
    }
}
