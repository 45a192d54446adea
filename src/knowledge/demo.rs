use super::entity::{Category, DomainEntity};

const SYMPTOMS: [&str; 7] = [
    "Persistent sadness or emptiness",
    "Insomnia or oversleeping",
    "Appetite changes",
    "Difficulty concentrating",
    "Fatigue or loss of energy",
    "Worthlessness or excessive guilt",
    "Recurrent thoughts of death",
];

const CAUSES: [&str; 5] = [
    "Genetic factors",
    "Neurotransmitter imbalance",
    "Psychosocial stress",
    "Major life events",
    "Chronic illness",
];

const DIAGNOSES: [&str; 4] = [
    "Clinical interview",
    "Psychometric scales",
    "Mental status examination",
    "Exclusion of organic disease",
];

const PREVENTIONS: [&str; 5] = [
    "Regular sleep schedule",
    "Healthy social relationships",
    "Moderate exercise",
    "Stress management skills",
    "Work-life balance",
];

const TREATMENTS: [&str; 5] = [
    "Pharmacotherapy",
    "Psychotherapy",
    "Cognitive behavioral therapy",
    "Interpersonal therapy",
    "Electroconvulsive therapy",
];

const MEDICATIONS: [&str; 4] = [
    "SSRIs",
    "SNRIs",
    "Tricyclic antidepressants",
    "Atypical antidepressants",
];

fn pick<'a>(source: &[&'a str], indices: &[usize]) -> Vec<&'a str> {
    indices.iter().map(|&index| source[index]).collect()
}

/// Built-in depression data set used when no entity file is given.
pub fn demo_entities() -> Vec<DomainEntity> {
    vec![
        DomainEntity::new(Category::Disease, "Mild depression")
            .with_detail("medicalCode", "F32.0")
            .with_detail("description", "Depressive episode with few, mild symptoms.")
            .with_relation("symptoms", pick(&SYMPTOMS, &[0, 1, 2, 4]))
            .with_relation("causes", pick(&CAUSES, &[2, 3]))
            .with_relation("diagnoses", pick(&DIAGNOSES, &[0, 1, 2]))
            .with_relation("preventions", pick(&PREVENTIONS, &[0, 1, 2, 3]))
            .with_relation("treatments", pick(&TREATMENTS, &[1, 2, 3]))
            .with_relation("medications", pick(&MEDICATIONS, &[0, 3])),
        DomainEntity::new(Category::Disease, "Major depression")
            .with_detail("medicalCode", "F32.2")
            .with_detail("description", "Severe depressive episode without psychotic features.")
            .with_relation("symptoms", pick(&SYMPTOMS, &[0, 1, 4, 5, 6]))
            .with_relation("causes", pick(&CAUSES, &[0, 1, 2, 4]))
            .with_relation("diagnoses", pick(&DIAGNOSES, &[0, 1, 2, 3]))
            .with_relation("preventions", pick(&PREVENTIONS, &[0, 1, 2, 3, 4]))
            .with_relation("treatments", pick(&TREATMENTS, &[0, 1, 2, 4]))
            .with_relation("medications", pick(&MEDICATIONS, &[0, 1, 2])),
        DomainEntity::new(Category::Disease, "Postpartum depression")
            .with_detail("medicalCode", "F53.0")
            .with_detail("prevalenceRate", 0.13)
            .with_relation("symptoms", pick(&SYMPTOMS, &[0, 1, 3]))
            .with_relation(
                "riskFactors",
                ["History of depression", "Sleep deprivation", "Lack of social support"],
            )
            .with_relation("therapies", ["Cognitive behavioral therapy", "Peer support groups"])
            .with_relation("medications", pick(&MEDICATIONS, &[0])),
    ]
}
