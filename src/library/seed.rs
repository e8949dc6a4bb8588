//! Starter prompts written into an empty library.

use crate::template::Template;

struct Starter {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    content: &'static str,
    profession: &'static str,
    category: &'static str,
    tone: &'static str,
    rating: f32,
    usage_count: u64,
    examples: &'static [(&'static str, &'static str)],
}

const STARTERS: &[Starter] = &[
    Starter {
        id: "welcome-email-new-hire",
        title: "Welcome email for new hires",
        description: "A warm first-day email introducing a new colleague to the team.",
        content: "Write a warm email welcoming {{employee_name}} to the {{team_name}} team. \
                  Mention their start date ({{start_date}}) and who to ask for help during \
                  the first week.",
        profession: "HR Manager",
        category: "Communication",
        tone: "Friendly",
        rating: 4.8,
        usage_count: 1250,
        examples: &[("employee_name", "Sarah Martin"), ("team_name", "Marketing")],
    },
    Starter {
        id: "service-agreement",
        title: "Service agreement",
        description: "A service agreement between a provider and a client.",
        content: "Draft a service agreement between {{client_name}} and {{company_name}} \
                  covering {{scope}}. Include payment terms, duration and termination clauses.",
        profession: "Lawyer",
        category: "Legal",
        tone: "Formal",
        rating: 4.9,
        usage_count: 890,
        examples: &[("client_name", "Acme Corp"), ("company_name", "Northwind Consulting")],
    },
    Starter {
        id: "social-media-strategy",
        title: "Social media content strategy",
        description: "A one-month content plan for a single platform.",
        content: "Create a one-month content strategy for {{platform}} about {{topic}}. \
                  Propose post formats, a publishing rhythm and three example posts.",
        profession: "Marketing Manager",
        category: "Marketing",
        tone: "Creative",
        rating: 4.7,
        usage_count: 2100,
        examples: &[("platform", "LinkedIn"), ("topic", "remote work")],
    },
    Starter {
        id: "coaching-plan",
        title: "Personal coaching plan",
        description: "A step-by-step coaching plan toward one goal.",
        content: "Build a {{duration}} coaching plan to reach the goal: {{goal}}. \
                  Break it into weekly milestones with one exercise each.",
        profession: "Professional Coach",
        category: "Development",
        tone: "Motivating",
        rating: 4.6,
        usage_count: 670,
        examples: &[("duration", "3-month"), ("goal", "public speaking confidence")],
    },
    Starter {
        id: "financial-analysis-report",
        title: "Financial analysis report",
        description: "Performance review with recommendations.",
        content: "Analyse the financial performance for {{period}} and propose three \
                  recommendations. Highlight the main risks.",
        profession: "Business Consultant",
        category: "Analysis",
        tone: "Analytical",
        rating: 4.8,
        usage_count: 540,
        examples: &[("period", "Q3 2024")],
    },
    Starter {
        id: "sales-pitch",
        title: "Sales pitch",
        description: "A short pitch convincing a prospect to adopt a solution.",
        content: "Write a sales pitch convincing {{prospect_name}} to adopt {{solution}}. \
                  Address their likely objections.",
        profession: "Sales Representative",
        category: "Sales",
        tone: "Persuasive",
        rating: 4.5,
        usage_count: 980,
        examples: &[("prospect_name", "Globex"), ("solution", "our CRM")],
    },
];

/// The built-in starter prompts. They have no owner and are public.
pub fn starter_templates() -> Vec<Template> {
    STARTERS
        .iter()
        .map(|s| {
            let mut template = Template::new(s.id, s.title, s.content)
                .with_description(s.description)
                .with_profession(s.profession)
                .with_category(s.category)
                .with_tone(s.tone);
            for (name, example) in s.examples {
                if let Some(existing) = template.variable(name).cloned() {
                    template = template.with_variable(existing.with_example(*example));
                }
            }
            template.rating = Some(s.rating);
            template.usage_count = s.usage_count;
            template.author = Some("Promptly".to_string());
            template
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::ids::validate_prompt_id;
    use crate::template::Variable;
    use std::collections::HashSet;

    #[test]
    fn test_starters_are_public_and_valid() {
        let templates = starter_templates();
        let ids: HashSet<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), templates.len());

        for template in &templates {
            assert!(validate_prompt_id(&template.id).is_ok());
            assert!(template.is_public);
            assert!(template.owner_id.is_none());
            assert!(!template.variables.is_empty());
        }
    }

    #[test]
    fn test_starter_examples_attach_to_variables() {
        let templates = starter_templates();
        let welcome = templates
            .iter()
            .find(|t| t.id == "welcome-email-new-hire")
            .unwrap();
        assert_eq!(
            welcome.variable("employee_name").map(|v| v.example.as_str()),
            Some("Sarah Martin")
        );
        assert!(Variable::new("start_date") == *welcome.variable("start_date").unwrap());
    }
}
