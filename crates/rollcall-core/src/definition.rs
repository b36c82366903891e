//! The WHO Surgical Safety Checklist, as narrated by the runner.
//!
//! Three phases: sign-in before anaesthesia, time-out before incision, and
//! sign-out before the patient leaves. Section titles are spoken as phase
//! announcements; each question is read aloud and answered yes/no.

use crate::model::SectionDef;

pub const SURGICAL_SAFETY_CHECKLIST: &[SectionDef] = &[
    SectionDef {
        title: "Before Induction of Anaesthesia",
        questions: &[
            "Has the patient confirmed identity, site, procedure, and consent?",
            "Is the site marked?",
            "Is the anaesthesia machine and medication check complete?",
            "Is the pulse oximeter functioning?",
            "Does the patient have a known allergy?",
            "Does the patient have a difficult airway or aspiration risk?",
            "Is there risk of more than 500ml blood loss?",
        ],
    },
    SectionDef {
        title: "Before Skin Incision",
        questions: &[
            "Have all team members introduced themselves?",
            "Has the patient's name and procedure been confirmed?",
            "Has antibiotic prophylaxis been given?",
            "What are the anticipated critical events?",
            "Is essential imaging displayed?",
        ],
    },
    SectionDef {
        title: "Before Patient Leaves Operating Room",
        questions: &[
            "Has instrument, sponge and needle count been completed?",
            "Have specimens been labeled correctly?",
            "Have equipment problems been addressed?",
            "What are the key concerns for recovery and management?",
        ],
    },
];
