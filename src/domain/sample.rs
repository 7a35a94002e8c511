//! Built-in sample questionnaire, used by `formtree seed`.

use crate::domain::entities::{WireNode, ROOT_ID};

fn node(id: &str, label: &str, children: Vec<WireNode>) -> WireNode {
    WireNode::new(id, label, children)
}

fn leaf(id: &str, label: &str) -> WireNode {
    WireNode::leaf(id, label)
}

/// A small age/school/profession questionnaire rooted at the initial node.
pub fn sample_forest() -> Vec<WireNode> {
    vec![node(
        ROOT_ID,
        "How old are you?",
        vec![
            node(
                "lower_18",
                "Younger than 18 years old",
                vec![node(
                    "school",
                    "Are you at school?",
                    vec![
                        node(
                            "yes_school",
                            "Yes",
                            vec![node(
                                "school_grade",
                                "What grade?",
                                vec![
                                    leaf("elementary_school", "Elementary school"),
                                    leaf("high_school", "High school"),
                                ],
                            )],
                        ),
                        leaf("no_school", "No"),
                    ],
                )],
            ),
            node(
                "between_18_and_65",
                "Between 18 and 65",
                vec![node(
                    "profession",
                    "What's your profession?",
                    vec![
                        node(
                            "engineer_profession",
                            "Engineer",
                            vec![node(
                                "driver_license",
                                "Do you have a driver license?",
                                vec![
                                    leaf("yes_driver_license", "Yes"),
                                    leaf("no_driver_license", "No"),
                                ],
                            )],
                        ),
                        leaf("doctor_profession", "Doctor"),
                        leaf("lawyer_profession", "Lawyer"),
                        leaf("educator_profession", "Educator"),
                    ],
                )],
            ),
            leaf("plus_65", "Older than 65 years old"),
        ],
    )]
}
