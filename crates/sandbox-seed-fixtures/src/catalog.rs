//! Collection definitions for every sample domain.

use sandbox_seed_store::{CollectionDef, DataType};

pub const VECTORIZER: &str = "text2vec-transformers";

pub const JEOPARDY_QUESTION: &str = "JeopardyQuestion";
pub const AUTHOR: &str = "Author";
pub const PUBLISHER: &str = "Publisher";
pub const BOOK: &str = "Book";
pub const REVIEW: &str = "Review";
pub const GITHUB_USER: &str = "GitHubUser";
pub const GITHUB_REPO: &str = "GitHubRepo";
pub const GITHUB_ISSUE: &str = "GitHubIssue";

fn collection(name: &str) -> CollectionDef {
    CollectionDef::new(name).vectorizer(VECTORIZER)
}

pub fn jeopardy_question() -> CollectionDef {
    collection(JEOPARDY_QUESTION)
        .text("question")
        .text("answer")
        .text_unvectorized("round")
        .int("value")
}

pub fn author() -> CollectionDef {
    collection(AUTHOR)
        .text("name")
        .text("bio")
        .int("birthYear")
        .boolean("isActive")
        .object(
            "address",
            &[
                ("street", DataType::Text),
                ("city", DataType::Text),
                ("country", DataType::Text),
                ("zipCode", DataType::Text),
            ],
        )
        .geo("coordinates")
}

pub fn publisher() -> CollectionDef {
    collection(PUBLISHER)
        .text("name")
        .int("foundedYear")
        .text_unvectorized("website")
        .object(
            "contactInfo",
            &[
                ("email", DataType::Text),
                ("phone", DataType::Text),
                ("address", DataType::Text),
            ],
        )
        .geo("headquarters")
}

pub fn book() -> CollectionDef {
    collection(BOOK)
        .text("title")
        .text("description")
        .text_unvectorized("isbn")
        .date("publishedDate")
        .int("pageCount")
        .number("price")
        .boolean("inStock")
        .text_unvectorized("genre")
        .object(
            "metadata",
            &[
                ("language", DataType::Text),
                ("edition", DataType::Text),
                ("format", DataType::Text),
                ("weight", DataType::Number),
            ],
        )
        .reference("writtenBy", AUTHOR)
        .reference("publishedBy", PUBLISHER)
}

pub fn review() -> CollectionDef {
    collection(REVIEW)
        .text("title")
        .text("content")
        .int("rating")
        .date("reviewDate")
        .boolean("verified")
        .object(
            "reviewer",
            &[
                ("name", DataType::Text),
                ("email", DataType::Text),
                ("memberSince", DataType::Date),
                ("totalReviews", DataType::Int),
            ],
        )
        .reference("reviewsBook", BOOK)
}

pub fn github_user() -> CollectionDef {
    collection(GITHUB_USER)
        .text_unvectorized("login")
        .text("name")
        .text("bio")
        .text("company")
        .text("location")
        .text_unvectorized("email")
        .boolean("hireable")
        .date("createdAt")
        .object(
            "stats",
            &[
                ("publicRepos", DataType::Int),
                ("publicGists", DataType::Int),
                ("followers", DataType::Int),
                ("following", DataType::Int),
            ],
        )
        .object(
            "urls",
            &[
                ("htmlUrl", DataType::Text),
                ("blog", DataType::Text),
                ("twitterUsername", DataType::Text),
            ],
        )
}

pub fn github_repo() -> CollectionDef {
    collection(GITHUB_REPO)
        .text("name")
        .text_unvectorized("fullName")
        .text("description")
        .text_unvectorized("language")
        .boolean("private")
        .boolean("fork")
        .boolean("archived")
        .date("createdAt")
        .date("updatedAt")
        .date("pushedAt")
        .int("size")
        .object(
            "metrics",
            &[
                ("stargazersCount", DataType::Int),
                ("watchersCount", DataType::Int),
                ("forksCount", DataType::Int),
                ("openIssuesCount", DataType::Int),
            ],
        )
        .text_unvectorized("topics")
        .object(
            "license",
            &[
                ("key", DataType::Text),
                ("name", DataType::Text),
                ("spdxId", DataType::Text),
            ],
        )
        .reference("ownedBy", GITHUB_USER)
}

pub fn github_issue() -> CollectionDef {
    let reactions: Vec<(&str, DataType)> = [
        "totalCount",
        "plusOne",
        "minusOne",
        "laugh",
        "hooray",
        "confused",
        "heart",
        "rocket",
        "eyes",
    ]
    .into_iter()
    .map(|name| (name, DataType::Int))
    .collect();

    collection(GITHUB_ISSUE)
        .text("title")
        .text("body")
        .int("number")
        .text_unvectorized("state")
        .boolean("locked")
        .date("createdAt")
        .date("updatedAt")
        .date("closedAt")
        .object(
            "labels",
            &[
                ("names", DataType::Text),
                ("colors", DataType::Text),
                ("count", DataType::Int),
            ],
        )
        .object("reactions", &reactions)
        .reference("belongsToRepo", GITHUB_REPO)
        .reference("createdBy", GITHUB_USER)
}

pub fn trivia_domain() -> Vec<CollectionDef> {
    vec![jeopardy_question()]
}

/// Authors and publishers first; books link to both, reviews link to books.
pub fn book_domain() -> Vec<CollectionDef> {
    vec![author(), publisher(), book(), review()]
}

pub fn github_domain() -> Vec<CollectionDef> {
    vec![github_user(), github_repo(), github_issue()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_seed_store::FieldDef;

    #[test]
    fn every_reference_points_into_its_own_domain() {
        for domain in [book_domain(), github_domain()] {
            let names: Vec<&str> = domain.iter().map(|d| d.name.as_str()).collect();
            for def in &domain {
                for (field, target) in def.references() {
                    assert!(
                        names.contains(&target),
                        "{}.{field} -> {target} is outside its domain",
                        def.name
                    );
                }
            }
        }
    }

    #[test]
    fn skipped_fields_match_the_sample_layout() {
        let skipped: Vec<String> = github_repo()
            .fields
            .iter()
            .filter_map(|f| match f {
                FieldDef::Scalar(p) if p.skip_vectorization => Some(p.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec!["fullName", "language", "topics"]);
    }

    #[test]
    fn issue_reactions_cover_all_counters() {
        let Some(FieldDef::Object { fields, .. }) = github_issue().field("reactions").cloned() else {
            panic!("reactions should be an object");
        };
        assert_eq!(fields.len(), 9);
        assert!(fields.iter().all(|p| p.data_type == DataType::Int));
    }
}
